//! The FieldVoice turn pipeline.
//!
//! One user turn flows through:
//!
//! 1. **Normalize** the utterance into the working language
//! 2. **Read** the conversation's context frame
//! 3. **Classify** intent against recent history and a context hint
//! 4. **Fuse** data from the sources the intent needs (chemical resolver,
//!    weather, vision, memory) together with carried-over context
//! 5. **Answer** from the fused bundle and translate back
//! 6. **Write** the bundle's effects back into the context frame
//!
//! Turns on the same conversation are serialized; frame writes carry a
//! version stamp so a write based on a stale read is rejected.

pub mod answer;
pub mod chemical;
pub mod classifier;
pub mod context;
pub mod fusion;
pub mod language;
pub mod locks;
pub mod notify;
pub mod pipeline;
pub mod vision;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use answer::AnswerGenerator;
pub use chemical::{ChemicalResolver, FuzzyMatcher, SearchSettings, build_semantic_query};
pub use classifier::{CLASSIFIER_PROMPT, IntentClassifier};
pub use context::{ContextFrameStore, FrameSnapshot, build_context_hint, prepare_context_updates};
pub use fusion::{FusionInput, FusionOrchestrator};
pub use language::{LanguageNormalizer, NormalizedText};
pub use locks::{ConversationLocks, TurnGuard};
pub use notify::{ThinkingEvent, ThinkingRegistry};
pub use pipeline::{PipelineSettings, Services, TurnOutcome, TurnPipeline, TurnRequest};
pub use vision::VisionStep;
