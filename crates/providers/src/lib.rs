//! Outbound clients for FieldVoice.
//!
//! Every client implements a `fieldvoice_core` collaborator trait:
//! the OpenAI-compatible provider serves generation and embeddings, the
//! translator wraps a provider, and the Elasticsearch index answers kNN
//! product queries. [`RetryProvider`] adds bounded retries to any provider.

pub mod elastic;
pub mod openai_compat;
pub mod retry;
pub mod translate;

pub use elastic::ElasticProductIndex;
pub use openai_compat::OpenAiCompatProvider;
pub use retry::RetryProvider;
pub use translate::LlmTranslator;

use std::sync::Arc;
use std::time::Duration;

use fieldvoice_config::AppConfig;
use fieldvoice_core::Provider;
use fieldvoice_core::error::ProviderError;

/// An HTTP client with a request timeout. Falls back to reqwest's default
/// client, which has no timeout, when the builder fails.
pub(crate) fn http_client(timeout: Duration, purpose: &str) -> reqwest::Client {
    build_or_default(
        reqwest::Client::builder().timeout(timeout).build(),
        purpose,
    )
}

fn build_or_default(built: reqwest::Result<reqwest::Client>, purpose: &str) -> reqwest::Client {
    built.unwrap_or_else(|e| {
        tracing::warn!(purpose, error = %e, "HTTP client build failed, using default client without timeout");
        reqwest::Client::new()
    })
}

/// Build the provider described by the config, wrapped in retries when
/// `pipeline.max_retries` is non-zero.
pub fn provider_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured(
            "No API key. Set FIELDVOICE_API_KEY or api_key in ~/.fieldvoice/config.toml".into(),
        )
    })?;

    let base: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::new("openai", &config.api_url, api_key));

    if config.pipeline.max_retries == 0 {
        return Ok(base);
    }

    Ok(Arc::new(RetryProvider::new(
        base,
        config.pipeline.max_retries,
        Duration::from_millis(config.pipeline.retry_backoff_ms),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_build_failure_falls_back_to_default() {
        let bad = reqwest::Client::builder()
            .user_agent("bad\nagent")
            .build();
        assert!(bad.is_err());
        let _client = build_or_default(bad, "test");
        let _timed = http_client(Duration::from_secs(5), "test");
    }

    #[test]
    fn missing_api_key_is_not_configured() {
        let config = AppConfig::default();
        let err = provider_from_config(&config).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn retries_wrap_the_base_provider() {
        let mut config = AppConfig {
            api_key: Some("sk-test".into()),
            ..AppConfig::default()
        };
        assert_eq!(provider_from_config(&config).unwrap().name(), "openai");

        config.pipeline.max_retries = 2;
        assert_eq!(provider_from_config(&config).unwrap().name(), "openai+retry");
    }
}
