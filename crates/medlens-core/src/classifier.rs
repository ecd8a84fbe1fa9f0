//! Upstream failure classification.
//!
//! Maps the text of an LLM provider failure onto a small taxonomy that is
//! stored on completed communications and aggregated by the statistics engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized category of an upstream LLM failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    QuotaExceeded,
    RateLimit,
    AuthFailed,
    InvalidKeyFormat,
    BadRequest,
    ServerError,
    UnknownError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuotaExceeded => "quota_exceeded",
            Self::RateLimit => "rate_limit",
            Self::AuthFailed => "auth_failed",
            Self::InvalidKeyFormat => "invalid_key_format",
            Self::BadRequest => "bad_request",
            Self::ServerError => "server_error",
            Self::UnknownError => "unknown_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorClassification {
    pub message: String,
    pub error_type: ErrorKind,
    pub error_code: Option<u16>,
}

/// Errors that can be classified.
///
/// Implementors only need `Display`; errors that carry an HTTP status should
/// also report it so unmatched failures keep their native code.
pub trait ClassifiableError: fmt::Display {
    fn status_code(&self) -> Option<u16> {
        None
    }
}

/// Classifies an error value by its rendered message and native status code.
pub fn classify<E: ClassifiableError + ?Sized>(error: &E) -> ErrorClassification {
    classify_message(error.to_string(), error.status_code())
}

/// Classifies a raw failure message.
///
/// Matching is case-insensitive and ordered; the first rule that matches wins,
/// so a message mentioning both "quota" and "401" is a quota failure.
/// `status_code` is only kept when no rule matches.
pub fn classify_message(
    message: impl Into<String>,
    status_code: Option<u16>,
) -> ErrorClassification {
    let message = message.into();
    let lower = message.to_lowercase();

    // "quota" also covers "insufficient_quota".
    let (error_type, error_code) = if lower.contains("quota") {
        (ErrorKind::QuotaExceeded, Some(429))
    } else if lower.contains("rate limit") || lower.contains("429") {
        (ErrorKind::RateLimit, Some(429))
    } else if lower.contains("invalid api key")
        || lower.contains("unauthorized")
        || lower.contains("401")
    {
        (ErrorKind::AuthFailed, Some(401))
    } else if lower.contains("api key specified is not a valid openai format") {
        (ErrorKind::InvalidKeyFormat, Some(400))
    } else if lower.contains("400") {
        (ErrorKind::BadRequest, Some(400))
    } else if lower.contains("500") {
        (ErrorKind::ServerError, Some(500))
    } else {
        (ErrorKind::UnknownError, status_code)
    };

    ErrorClassification {
        message,
        error_type,
        error_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StatusError {
        status: u16,
        text: &'static str,
    }

    impl fmt::Display for StatusError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.text)
        }
    }

    impl ClassifiableError for StatusError {
        fn status_code(&self) -> Option<u16> {
            Some(self.status)
        }
    }

    #[test]
    fn test_rate_limit() {
        let result = classify_message("Rate limit reached, please retry. (429)", None);
        assert_eq!(result.error_type, ErrorKind::RateLimit);
        assert_eq!(result.error_code, Some(429));
    }

    #[test]
    fn test_auth_failed() {
        let result = classify_message("Incorrect API key provided: sk-***. 401 Unauthorized", None);
        assert_eq!(result.error_type, ErrorKind::AuthFailed);
        assert_eq!(result.error_code, Some(401));
    }

    #[test]
    fn test_quota_takes_priority() {
        let result = classify_message("You exceeded your current quota (401)", None);
        assert_eq!(result.error_type, ErrorKind::QuotaExceeded);
        assert_eq!(result.error_code, Some(429));

        let result = classify_message("Error code: insufficient_quota", None);
        assert_eq!(result.error_type, ErrorKind::QuotaExceeded);
    }

    #[test]
    fn test_invalid_key_format() {
        let result = classify_message(
            "The API key specified is not a valid OpenAI format",
            None,
        );
        assert_eq!(result.error_type, ErrorKind::InvalidKeyFormat);
        assert_eq!(result.error_code, Some(400));
    }

    #[test]
    fn test_status_digits() {
        assert_eq!(
            classify_message("HTTP 400 malformed body", None).error_type,
            ErrorKind::BadRequest
        );
        assert_eq!(
            classify_message("upstream returned 500", None).error_type,
            ErrorKind::ServerError
        );
    }

    #[test]
    fn test_unknown_keeps_native_status() {
        let error = StatusError {
            status: 503,
            text: "service unavailable",
        };
        let result = classify(&error);
        assert_eq!(result.error_type, ErrorKind::UnknownError);
        assert_eq!(result.error_code, Some(503));
        assert_eq!(result.message, "service unavailable");

        let result = classify_message("connection reset", None);
        assert_eq!(result.error_code, None);
    }

    #[test]
    fn test_matched_rule_overrides_native_status() {
        let error = StatusError {
            status: 503,
            text: "Rate limit exceeded",
        };
        assert_eq!(classify(&error).error_code, Some(429));
    }
}
