//! Core domain of MedLens: tracking of LLM communications made by healthcare
//! AI agents.
//!
//! The [`CommunicationTracker`] records each agent session with its messages,
//! token usage, cost, timing and classified errors, and serves aggregate
//! statistics, quota reports and JSON exports over the recorded data.

pub mod classifier;
pub mod communication;
pub mod config;
pub mod error;
pub mod export;
pub mod notify;
pub mod pricing;
pub mod stats;
pub mod tracker;
pub mod view;

// Re-export common types
pub use classifier::{ClassifiableError, ErrorClassification, ErrorKind, classify, classify_message};
pub use error::{MedlensError, Result};
pub use tracker::CommunicationTracker;
