//! Error types for the MedLens tracker.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the MedLens workspace.
///
/// Failures of the tracked LLM calls themselves are never represented here;
/// those are classified into [`crate::classifier::ErrorKind`] and stored as data
/// on the completed communication.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum MedlensError {
    /// A looked-up record does not exist (or was discarded as empty)
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Export was requested in a format the tracker cannot produce
    #[error("Unsupported export format: {0}")]
    UnsupportedExportFormat(String),

    /// Completion notification could not be delivered
    #[error("Notification error: {0}")]
    Notification(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MedlensError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Notification error
    pub fn notification(message: impl Into<String>) -> Self {
        Self::Notification(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<std::io::Error> for MedlensError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for MedlensError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MedlensError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, MedlensError>`.
pub type Result<T> = std::result::Result<T, MedlensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_names_the_format() {
        let err = MedlensError::UnsupportedExportFormat("csv".to_string());
        assert_eq!(err.to_string(), "Unsupported export format: csv");
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: MedlensError = io.into();
        assert!(err.to_string().contains("NotFound"));
    }

    #[test]
    fn test_toml_conversion() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("key = ");
        let err: MedlensError = parsed.unwrap_err().into();
        match err {
            MedlensError::Serialization { format, .. } => assert_eq!(format, "TOML"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
