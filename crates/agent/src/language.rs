//! Language normalization — into the working language and back.

use std::sync::Arc;

use fieldvoice_core::{Result, Translator};
use tracing::debug;

/// A user utterance alongside its working-language rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedText {
    /// The text exactly as the user sent it
    pub original: String,
    /// The text in the working language (same as `original` when no translation ran)
    pub working: String,
    /// Detected language code of `original`
    pub language: String,
}

impl NormalizedText {
    pub fn was_translated(&self) -> bool {
        self.original != self.working
    }
}

pub struct LanguageNormalizer {
    translator: Arc<dyn Translator>,
    working_language: String,
}

impl LanguageNormalizer {
    pub fn new(translator: Arc<dyn Translator>, working_language: impl Into<String>) -> Self {
        Self {
            translator,
            working_language: working_language.into(),
        }
    }

    pub fn working_language(&self) -> &str {
        &self.working_language
    }

    /// Detect the language of `text` and translate it into the working language.
    pub async fn normalize(&self, text: &str, user_id: &str) -> Result<NormalizedText> {
        let language = self.translator.detect_language(text, user_id).await?;

        let working = if language == self.working_language {
            text.to_string()
        } else {
            self.translator
                .translate(text, &language, &self.working_language, user_id)
                .await?
        };

        debug!(user_id, language = %language, translated = language != self.working_language, "Normalized input");

        Ok(NormalizedText {
            original: text.to_string(),
            working,
            language,
        })
    }

    /// Translate a working-language answer back into `language`.
    pub async fn restore(&self, answer: &str, language: &str, user_id: &str) -> Result<String> {
        if language == self.working_language {
            return Ok(answer.to_string());
        }
        Ok(self
            .translator
            .translate(answer, &self.working_language, language, user_id)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedTranslator;
    use fieldvoice_core::Error;
    use fieldvoice_core::error::ProviderError;

    #[tokio::test]
    async fn working_language_input_is_not_translated() {
        let translator = Arc::new(ScriptedTranslator::new("en"));
        let normalizer = LanguageNormalizer::new(translator.clone(), "en");

        let text = normalizer.normalize("what kills aphids?", "u1").await.unwrap();
        assert_eq!(text.working, "what kills aphids?");
        assert_eq!(text.language, "en");
        assert!(!text.was_translated());
        assert!(translator.translations().is_empty());
    }

    #[tokio::test]
    async fn foreign_input_round_trips_through_translator() {
        let translator = Arc::new(ScriptedTranslator::new("zu"));
        let normalizer = LanguageNormalizer::new(translator.clone(), "en");

        let text = normalizer.normalize("Sawubona", "u1").await.unwrap();
        assert_eq!(text.working, "[zu->en] Sawubona");
        assert!(text.was_translated());

        let back = normalizer.restore("Use ProductX", &text.language, "u1").await.unwrap();
        assert_eq!(back, "[en->zu] Use ProductX");
        assert_eq!(translator.translations().len(), 2);
    }

    #[tokio::test]
    async fn translator_failure_fails_normalization() {
        let translator = Arc::new(ScriptedTranslator::failing(ProviderError::Network("down".into())));
        let normalizer = LanguageNormalizer::new(translator, "en");

        let err = normalizer.normalize("hello", "u1").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::Network(_))));
    }
}
