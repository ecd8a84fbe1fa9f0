//! Bulk export of tracked communications.

use crate::error::{MedlensError, Result};
use crate::tracker::CommunicationStore;
use std::fmt;
use std::str::FromStr;

/// Output formats supported by [`crate::tracker::CommunicationTracker::export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Pretty-printed JSON array with ISO-8601 timestamps.
    #[default]
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = MedlensError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            other => Err(MedlensError::UnsupportedExportFormat(other.to_string())),
        }
    }
}

/// Serializes every stored communication, open or completed, in insertion order.
pub(crate) fn export_store(store: &CommunicationStore, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => {
            let records: Vec<_> = store.iter().collect();
            Ok(serde_json::to_string_pretty(&records)?)
        }
    }
}
