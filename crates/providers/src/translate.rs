//! Language detection and translation over a generation provider.

use std::sync::Arc;

use async_trait::async_trait;
use fieldvoice_core::error::ProviderError;
use fieldvoice_core::provider::ProviderRequest;
use fieldvoice_core::{Provider, Translator};
use tracing::debug;

/// A [`Translator`] that prompts a generation model.
pub struct LlmTranslator {
    provider: Arc<dyn Provider>,
    model: String,
}

impl LlmTranslator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    async fn ask(&self, prompt: String, user_id: &str) -> Result<String, ProviderError> {
        let request = ProviderRequest::prompt(&self.model, prompt, 0.0).for_user(user_id);
        let response = self.provider.complete(request).await?;
        Ok(response.text().to_string())
    }
}

/// Reduce a model reply like `"Zu."` or `language: en` to a bare code.
fn parse_language_code(reply: &str) -> Option<String> {
    let token = reply
        .rsplit(|c: char| c.is_whitespace() || c == ':')
        .find(|t| !t.is_empty())?;
    let code: String = token
        .trim_matches(|c: char| !c.is_ascii_alphabetic())
        .to_ascii_lowercase();
    let valid = (2..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_lowercase());
    valid.then_some(code)
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn detect_language(&self, text: &str, user_id: &str) -> Result<String, ProviderError> {
        let prompt = format!(
            "Identify the language of the text below. Reply with only its ISO 639-1 code \
             (for example en, zu, xh, af, st).\n\nTEXT:\n{text}"
        );
        let reply = self.ask(prompt, user_id).await?;
        let code = parse_language_code(&reply).ok_or_else(|| {
            ProviderError::InvalidResponse(format!("not a language code: {reply:?}"))
        })?;
        debug!(user_id, language = %code, "Detected language");
        Ok(code)
    }

    async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        user_id: &str,
    ) -> Result<String, ProviderError> {
        if from == to || text.trim().is_empty() {
            return Ok(text.to_string());
        }
        let prompt = format!(
            "Translate the text below from '{from}' to '{to}'. Keep product names, \
             numbers and units unchanged. Reply with only the translation.\n\nTEXT:\n{text}"
        );
        self.ask(prompt, user_id).await
    }
}
