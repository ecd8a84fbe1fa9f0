//! Tracker configuration model.
//!
//! Loading lives in `medlens-infrastructure`; this module only defines the
//! shape of `config.toml` and its defaults.

use crate::communication::LlmProvider;
use crate::notify::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
use crate::pricing::{ModelPrice, PricingTable};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct TrackerConfig {
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Extra or overriding price rows applied on top of the built-in table.
    #[serde(default)]
    pub pricing: Vec<PricingEntry>,
}

impl TrackerConfig {
    /// Built-in pricing with the configured rows layered on top.
    pub fn pricing_table(&self) -> PricingTable {
        let mut table = PricingTable::default();
        for entry in &self.pricing {
            table.set_price(
                entry.provider,
                entry.model.clone(),
                ModelPrice::new(entry.input_per_1k, entry.output_per_1k),
            );
        }
        table
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Completion notifications are disabled when unset.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl WebhookConfig {
    pub fn is_enabled(&self) -> bool {
        self.url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_timeout_secs(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info,medlens_core=debug"`.
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PricingEntry {
    pub provider: LlmProvider,
    pub model: String,
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_WEBHOOK_TIMEOUT_SECS
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: TrackerConfig = toml::from_str("").unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.webhook.timeout_secs, 5);
        assert_eq!(config.webhook.workers, 5);
        assert_eq!(config.logging.filter, "info");
        assert!(!config.webhook.is_enabled());
    }

    #[test]
    fn test_parse_full_document() {
        let config: TrackerConfig = toml::from_str(
            r#"
            [webhook]
            url = "http://localhost:9000/hook"
            workers = 2

            [logging]
            filter = "debug"
            json = true

            [[pricing]]
            provider = "anthropic"
            model = "claude-3-haiku"
            input_per_1k = 0.00025
            output_per_1k = 0.00125
            "#,
        )
        .unwrap();

        assert!(config.webhook.is_enabled());
        assert_eq!(config.webhook.workers, 2);
        assert_eq!(config.webhook.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.logging.json);

        let table = config.pricing_table();
        let cost = table.calculate_cost(LlmProvider::Anthropic, "claude-3-haiku", 1000, 1000);
        assert!((cost - 0.0015).abs() < 1e-9);
        // Built-in rows survive.
        assert!(table.price_for(LlmProvider::OpenAi, "gpt-4").is_some());
    }

    #[test]
    fn test_blank_url_is_disabled() {
        let webhook = WebhookConfig {
            url: Some("  ".into()),
            ..WebhookConfig::default()
        };
        assert!(!webhook.is_enabled());
    }
}
