pub mod config_service;
pub mod paths;

pub use crate::config_service::{CONFIG_PATH_ENV, ConfigService, WEBHOOK_URL_ENV};
pub use crate::paths::MedlensPaths;
