//! Composition root: configuration, logging and the shared tracker.

use anyhow::{Context, Result};
use medlens_core::CommunicationTracker;
use medlens_core::config::TrackerConfig;
use medlens_core::notify::NotificationDispatcher;
use medlens_infrastructure::ConfigService;
use medlens_interaction::WebhookNotifier;
use medlens_telemetry::LifecycleEventLayer;
use std::path::PathBuf;
use std::sync::Arc;

pub fn load_config(path: Option<PathBuf>) -> Result<TrackerConfig> {
    let service = match path {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    };
    service.get_config().context("Failed to load configuration")
}

pub fn init_logging(config: &TrackerConfig, lifecycle: Option<LifecycleEventLayer>) -> Result<()> {
    medlens_telemetry::init_tracing(&config.logging, lifecycle)
        .context("Failed to initialize logging")
}

/// Builds the process-wide tracker. A webhook dispatcher is attached when a
/// webhook url is configured; this requires a running tokio runtime.
pub fn build_tracker(config: &TrackerConfig) -> Result<Arc<CommunicationTracker>> {
    let tracker = CommunicationTracker::with_pricing(config.pricing_table());

    let tracker = match WebhookNotifier::from_config(&config.webhook) {
        Some(notifier) => {
            tracing::info!("Completion webhook enabled: {}", notifier.url());
            let dispatcher = NotificationDispatcher::spawn(
                Arc::new(notifier),
                config.webhook.workers,
                config.webhook.queue_capacity,
            )
            .context("Failed to start webhook dispatcher")?;
            tracker.with_dispatcher(dispatcher)
        }
        None => tracker,
    };

    Ok(Arc::new(tracker))
}
