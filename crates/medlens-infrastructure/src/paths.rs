//! Path resolution for medlens configuration files.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for medlens.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/medlens/           # Config directory (XDG on Linux)
/// └── config.toml              # Tracker configuration
/// ```
pub struct MedlensPaths;

impl MedlensPaths {
    const APP_NAME: &'static str = "medlens";

    /// Returns the medlens configuration directory (e.g. `~/.config/medlens/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(Self::APP_NAME))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_is_under_config_dir() {
        // Skipped on hosts without a resolvable config directory.
        if let (Ok(dir), Ok(file)) = (MedlensPaths::config_dir(), MedlensPaths::config_file()) {
            assert!(dir.ends_with("medlens"));
            assert_eq!(file.parent(), Some(dir.as_path()));
        }
    }
}
