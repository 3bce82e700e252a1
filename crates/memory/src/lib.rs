//! Storage implementations for FieldVoice.
//!
//! - [`InMemoryStore`] and [`SqliteStore`] implement `ConversationStore`,
//!   both enforcing the context-frame version stamp.
//! - [`InMemoryProductIndex`] answers kNN queries by cosine similarity for
//!   tests and offline catalogs.
//! - [`InMemoryUserDirectory`] serves user profiles from a fixed table.

pub mod directory;
pub mod in_memory;
pub mod vector;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use directory::InMemoryUserDirectory;
pub use in_memory::InMemoryStore;
pub use vector::{InMemoryProductIndex, IndexedProduct, cosine_similarity};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
