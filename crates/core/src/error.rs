//! Error types for the FieldVoice domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator boundary has its own error enum; the top-level
//! [`Error`] wraps them so a failed turn carries the original cause.

use thiserror::Error;

/// The top-level error type for all FieldVoice operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Generation / embedding / translation ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Conversation persistence ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Product index ---
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    // --- Weather, vision, images, speech, users ---
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    // --- Turn input ---
    #[error("Turn error: {0}")]
    Turn(#[from] TurnError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether a repeat of the same call could plausibly succeed.
    ///
    /// Rate limits, timeouts, connection failures and 5xx responses are
    /// transient; auth, configuration and malformed responses are terminal.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_) | Self::NotConfigured(_) | Self::InvalidResponse(_) => {
                false
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(
        "Context frame of conversation {conversation_id} changed concurrently \
         (expected version {expected}, found {found})"
    )]
    VersionConflict {
        conversation_id: String,
        expected: u64,
        found: u64,
    },

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    Request(String),

    #[error("Invalid search response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{service} call failed: {reason}")]
    Failed { service: String, reason: String },

    #[error("{0} is not configured")]
    Unavailable(String),
}

impl CollaboratorError {
    pub fn failed(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            service: service.into(),
            reason: reason.into(),
        }
    }
}

/// Errors caused by what the caller handed to a turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Image not found for artifactId: {0}")]
    ImageNotFound(String),

    #[error("Images were attached but no vision service is configured")]
    VisionUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn transient_classification() {
        assert!(ProviderError::RateLimited { retry_after_secs: 1 }.is_transient());
        assert!(ProviderError::Network("reset".into()).is_transient());
        assert!(
            ProviderError::ApiError {
                status_code: 503,
                message: "unavailable".into()
            }
            .is_transient()
        );
        assert!(
            !ProviderError::ApiError {
                status_code: 400,
                message: "bad request".into()
            }
            .is_transient()
        );
        assert!(!ProviderError::AuthenticationFailed("bad key".into()).is_transient());
    }

    #[test]
    fn version_conflict_mentions_both_versions() {
        let err = StoreError::VersionConflict {
            conversation_id: "c1".into(),
            expected: 3,
            found: 4,
        };
        let text = err.to_string();
        assert!(text.contains("c1"));
        assert!(text.contains('3'));
        assert!(text.contains('4'));
    }

    #[test]
    fn image_not_found_names_artifact() {
        let err = Error::from(TurnError::ImageNotFound("art_9".into()));
        assert!(err.to_string().contains("art_9"));
    }
}
