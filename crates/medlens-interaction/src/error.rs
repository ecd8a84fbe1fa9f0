//! Errors surfaced by wrapped LLM calls.

use medlens_core::ClassifiableError;
use thiserror::Error;

/// Failure of a wrapped agent or LLM call.
///
/// Adapters record these on the tracked communication and then hand them back
/// to the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmCallError {
    /// The provider answered with an error.
    #[error("{message}")]
    Api {
        status_code: Option<u16>,
        message: String,
        retry_count: u32,
    },

    /// The request never produced a provider response.
    #[error("LLM request failed: {0}")]
    Transport(String),
}

impl LlmCallError {
    pub fn api(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
            retry_count: 0,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Number of retries the caller made before giving up.
    pub fn with_retry_count(self, retry_count: u32) -> Self {
        match self {
            Self::Api {
                status_code,
                message,
                ..
            } => Self::Api {
                status_code,
                message,
                retry_count,
            },
            other => other,
        }
    }

    pub fn retry_count(&self) -> u32 {
        match self {
            Self::Api { retry_count, .. } => *retry_count,
            Self::Transport(_) => 0,
        }
    }
}

impl ClassifiableError for LlmCallError {
    fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status_code, .. } => *status_code,
            Self::Transport(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medlens_core::{ErrorKind, classify};

    #[test]
    fn test_classify_uses_message_and_status() {
        let quota = LlmCallError::api(Some(429), "You exceeded your current quota");
        let classification = classify(&quota);
        assert_eq!(classification.error_type, ErrorKind::QuotaExceeded);
        assert_eq!(classification.error_code, Some(429));

        let unknown = LlmCallError::api(Some(418), "teapot");
        let classification = classify(&unknown);
        assert_eq!(classification.error_type, ErrorKind::UnknownError);
        assert_eq!(classification.error_code, Some(418));

        let transport = LlmCallError::transport("connection reset");
        assert_eq!(classify(&transport).error_code, None);
        assert_eq!(classify(&transport).message, "LLM request failed: connection reset");
    }

    #[test]
    fn test_retry_count() {
        let err = LlmCallError::api(Some(500), "boom").with_retry_count(2);
        assert_eq!(err.retry_count(), 2);
        assert_eq!(LlmCallError::transport("x").with_retry_count(4).retry_count(), 0);
    }
}
