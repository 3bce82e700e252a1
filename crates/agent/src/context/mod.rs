//! Conversation context carried between turns.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`ContextFrameStore`] | Versioned read/write of a conversation's frame |
//! | [`build_context_hint`] | Frame → grounding sentence for the classifier |
//! | [`prepare_context_updates`] | Fused bundle → ordered frame updates |

pub mod hint;
pub mod store;
pub mod updater;

pub use hint::build_context_hint;
pub use store::{ContextFrameStore, FrameSnapshot};
pub use updater::prepare_context_updates;
