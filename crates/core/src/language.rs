//! Translator trait — language detection and translation.
//!
//! Both calls are plain collaborator calls: a failure here fails the turn.

use async_trait::async_trait;
use crate::error::ProviderError;

#[async_trait]
pub trait Translator: Send + Sync {
    /// Detect the language of `text`, returning a code such as `"en"` or `"zu"`.
    async fn detect_language(&self, text: &str, user_id: &str) -> Result<String, ProviderError>;

    /// Translate `text` from one language code to another.
    async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        user_id: &str,
    ) -> Result<String, ProviderError>;
}
