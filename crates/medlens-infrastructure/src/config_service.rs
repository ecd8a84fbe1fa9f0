//! Configuration service implementation.
//!
//! Loads the tracker configuration from `config.toml`. The file is looked up
//! in this order:
//!
//! 1. an explicit path passed to [`ConfigService::with_path`]
//! 2. the `MEDLENS_CONFIG` environment variable
//! 3. `~/.config/medlens/config.toml`
//!
//! A missing file yields the defaults. `WEBHOOK_URL` overrides the webhook url
//! from the file.

use crate::paths::MedlensPaths;
use medlens_core::config::TrackerConfig;
use medlens_core::{MedlensError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

pub const CONFIG_PATH_ENV: &str = "MEDLENS_CONFIG";
pub const WEBHOOK_URL_ENV: &str = "WEBHOOK_URL";

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Configuration service that loads and caches the tracker configuration.
#[derive(Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
    env: EnvLookup,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<TrackerConfig>>>,
}

impl ConfigService {
    /// Creates a service that resolves the config file from the environment.
    pub fn new() -> Self {
        Self {
            path: None,
            env: Arc::new(|key| std::env::var(key).ok()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service that always reads `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new()
        }
    }

    /// Replaces the environment lookup used for `MEDLENS_CONFIG` and `WEBHOOK_URL`.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or parsed.
    pub fn get_config(&self) -> Result<TrackerConfig> {
        {
            let cached = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = self.load_config()?;

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The file this service reads, if one can be resolved.
    pub fn config_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        if let Some(path) = (self.env)(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        MedlensPaths::config_file().map_err(|e| MedlensError::config(e.to_string()))
    }

    fn load_config(&self) -> Result<TrackerConfig> {
        let path = self.config_path()?;
        let mut config = Self::read_file(&path)?;

        if let Some(url) = (self.env)(WEBHOOK_URL_ENV).filter(|url| !url.is_empty()) {
            tracing::debug!("Webhook url taken from {}", WEBHOOK_URL_ENV);
            config.webhook.url = Some(url);
        }
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<TrackerConfig> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(TrackerConfig::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            MedlensError::io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = toml::from_str(&content).map_err(|e| {
            MedlensError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigService")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
