//! Framework adapters and outbound integrations for the communication tracker.
//!
//! - [`autogen`]: decorator for AutoGen-style reply agents
//! - [`crewai`]: decorator for CrewAI-style LLM callables
//! - [`webhook`]: HTTP delivery of completion events

pub mod adapter;
pub mod autogen;
pub mod crewai;
pub mod error;
pub mod tokens;
pub mod webhook;

pub use adapter::AgentIdentity;
pub use autogen::{ChatMessage, Reply, ReplyAgent, TrackedReplyAgent};
pub use crewai::{LlmCall, TrackedLlm};
pub use error::LlmCallError;
pub use tokens::estimate_tokens;
pub use webhook::WebhookNotifier;
