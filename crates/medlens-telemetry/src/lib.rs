//! Logging setup for medlens binaries.

pub mod tracing_layer;

pub use tracing_layer::{LifecycleEvent, LifecycleEventLayer, TRACKER_TARGET};

use medlens_core::config::LoggingConfig;
use medlens_core::{MedlensError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Builds the log filter: `RUST_LOG` wins over the configured directive.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter)
        .map_err(|e| MedlensError::config(format!("Invalid log filter '{}': {}", config.filter, e)))
}

/// Installs the global subscriber: env filter, plain or JSON output on stderr,
/// and optionally the lifecycle event layer.
///
/// # Errors
///
/// Fails on an invalid filter directive or when a global subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig, lifecycle: Option<LifecycleEventLayer>) -> Result<()> {
    let registry = tracing_subscriber::registry()
        .with(build_filter(config)?)
        .with(lifecycle);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    installed.map_err(|e| {
        MedlensError::internal(format!("Failed to install tracing subscriber: {}", e))
    })
}
