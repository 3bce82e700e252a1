//! Provider retry — bounded repeats of transient failures.
//!
//! Wraps a single provider. Only errors for which
//! [`ProviderError::is_transient`] holds are retried; auth and
//! malformed-response errors surface on the first attempt. Each retry waits
//! `backoff * attempt`, or the provider's `retry_after` hint when larger.

use async_trait::async_trait;
use fieldvoice_core::error::ProviderError;
use fieldvoice_core::provider::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct RetryProvider {
    name: String,
    inner: Arc<dyn fieldvoice_core::Provider>,
    max_retries: u32,
    backoff: Duration,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn fieldvoice_core::Provider>, max_retries: u32, backoff: Duration) -> Self {
        Self {
            name: format!("{}+retry", inner.name()),
            inner,
            max_retries,
            backoff,
        }
    }

    fn delay(&self, attempt: u32, error: &ProviderError) -> Duration {
        let linear = self.backoff * attempt;
        match error {
            ProviderError::RateLimited { retry_after_secs } => {
                linear.max(Duration::from_secs(*retry_after_secs).min(self.backoff * 20))
            }
            _ => linear,
        }
    }

    async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(provider = %self.name, operation, attempt, "Retry: succeeded");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.delay(attempt, &e);
                    warn!(
                        provider = %self.name,
                        operation,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retry: transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl fieldvoice_core::Provider for RetryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        self.run("complete", || self.inner.complete(request.clone())).await
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        self.run("embed", || self.inner.embed(request.clone())).await
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldvoice_core::Provider;
    use fieldvoice_core::message::Message;
    use std::sync::Mutex;

    /// Fails with the scripted errors in order, then succeeds.
    struct FlakyProvider {
        errors: Mutex<Vec<ProviderError>>,
        call_count: Mutex<usize>,
    }

    impl FlakyProvider {
        fn new(errors: Vec<ProviderError>) -> Self {
            Self {
                errors: Mutex::new(errors),
                call_count: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl fieldvoice_core::Provider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            let mut errors = self.errors.lock().unwrap();
            if errors.is_empty() {
                Ok(ProviderResponse {
                    message: Message::assistant("success"),
                    usage: None,
                    model: "m".into(),
                })
            } else {
                Err(errors.remove(0))
            }
        }
    }

    fn request() -> ProviderRequest {
        ProviderRequest::prompt("m", "hello", 0.0)
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_until_success() {
        let inner = Arc::new(FlakyProvider::new(vec![
            ProviderError::Network("reset".into()),
            ProviderError::ApiError {
                status_code: 502,
                message: "bad gateway".into(),
            },
        ]));
        let retry = RetryProvider::new(inner.clone(), 3, Duration::from_millis(10));

        let response = retry.complete(request()).await.unwrap();
        assert_eq!(response.text(), "success");
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let inner = Arc::new(FlakyProvider::new(vec![
            ProviderError::Timeout("1".into()),
            ProviderError::Timeout("2".into()),
            ProviderError::Timeout("3".into()),
        ]));
        let retry = RetryProvider::new(inner.clone(), 2, Duration::from_millis(10));

        let err = retry.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(ref m) if m == "3"));
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn terminal_errors_are_not_retried() {
        let inner = Arc::new(FlakyProvider::new(vec![ProviderError::AuthenticationFailed(
            "bad key".into(),
        )]));
        let retry = RetryProvider::new(inner.clone(), 5, Duration::from_millis(10));

        let err = retry.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));
        assert_eq!(inner.calls(), 1);
    }

    #[test]
    fn rate_limit_hint_raises_delay() {
        let inner = Arc::new(FlakyProvider::new(vec![]));
        let retry = RetryProvider::new(inner, 1, Duration::from_millis(250));
        let delay = retry.delay(1, &ProviderError::RateLimited { retry_after_secs: 2 });
        assert_eq!(delay, Duration::from_secs(2));
        let delay = retry.delay(2, &ProviderError::Network("x".into()));
        assert_eq!(delay, Duration::from_millis(500));
    }

    #[test]
    fn name_marks_wrapper() {
        let retry = RetryProvider::new(Arc::new(FlakyProvider::new(vec![])), 1, Duration::ZERO);
        assert_eq!(retry.name(), "flaky+retry");
    }
}
