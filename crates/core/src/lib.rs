//! # FieldVoice Core
//!
//! Domain types, collaborator traits, and error definitions for the FieldVoice
//! agronomy agent. This crate does no I/O: it defines the shapes that flow
//! through a turn (context frames, intents, data bundles, chemical matches)
//! and the traits every outside service is reached through.
//!
//! ## Design Philosophy
//!
//! Every collaborator is a trait here. Implementations live in their
//! respective crates (`fieldvoice-providers`, `fieldvoice-memory`) or in
//! tests as scripted mocks. All crates depend inward on core.

pub mod error;
pub mod message;
pub mod provider;
pub mod context;
pub mod intent;
pub mod chemical;
pub mod bundle;
pub mod language;
pub mod search;
pub mod store;
pub mod vision;
pub mod weather;
pub mod media;
pub mod user;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Conversation, ConversationId, HistoryLine, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use context::{ContextFrame, ContextUpdate, Entity, TaskKind};
pub use intent::{Intent, Needs, Targets};
pub use chemical::{ChemicalContext, ChemicalMatch, ChemicalSearchResult};
pub use bundle::{ConversationContext, DataBundle, SourceResult};
pub use language::Translator;
pub use search::{KnnQuery, ProductIndex, SearchHit};
pub use store::ConversationStore;
pub use vision::{Catalog, Detection, VisionResult, VisionService};
pub use weather::WeatherService;
pub use media::{ImageStore, SpeechSynthesizer};
pub use user::{UserDirectory, UserProfile};
