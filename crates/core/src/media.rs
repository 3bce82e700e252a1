//! Image artifact and speech synthesis collaborators.

use std::path::PathBuf;

use async_trait::async_trait;
use crate::error::CollaboratorError;

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Local file for an uploaded artifact, `None` if it does not exist.
    async fn resolve_local_path(&self, artifact_id: &str) -> Result<Option<PathBuf>, CollaboratorError>;

    /// Attach artifacts to a saved message.
    async fn link_to_message(&self, artifact_ids: &[String], message_id: &str) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render `text` to audio and return where it was written.
    async fn generate_audio(&self, text: &str) -> Result<String, CollaboratorError>;
}
