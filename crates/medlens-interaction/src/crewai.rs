//! Tracking decorator for CrewAI-style LLM callables.
//!
//! A CrewAI agent hands a single prompt to its LLM and receives a single
//! completion. Neither side reports usage, so token counts are estimated.

use crate::adapter::{AgentIdentity, elapsed_ms};
use crate::error::LlmCallError;
use crate::tokens::estimate_tokens;
use async_trait::async_trait;
use medlens_core::communication::{AgentFramework, MessageDraft};
use medlens_core::tracker::Completion;
use medlens_core::{CommunicationTracker, classify};
use std::sync::Arc;
use std::time::Instant;

const DEFAULT_MODEL: &str = "gpt-4";

/// Prompt-in, completion-out LLM interface.
#[async_trait]
pub trait LlmCall: Send + Sync {
    fn model_name(&self) -> Option<&str> {
        None
    }

    async fn call(&self, prompt: &str) -> Result<String, LlmCallError>;
}

/// [`LlmCall`] decorator that tracks every call as one communication.
pub struct TrackedLlm<L> {
    inner: L,
    tracker: Arc<CommunicationTracker>,
    identity: AgentIdentity,
}

impl<L: LlmCall> TrackedLlm<L> {
    pub fn new(inner: L, tracker: Arc<CommunicationTracker>, identity: AgentIdentity) -> Self {
        Self {
            inner,
            tracker,
            identity,
        }
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }
}

#[async_trait]
impl<L: LlmCall> LlmCall for TrackedLlm<L> {
    fn model_name(&self) -> Option<&str> {
        self.inner.model_name()
    }

    async fn call(&self, prompt: &str) -> Result<String, LlmCallError> {
        let model = self.inner.model_name().unwrap_or(DEFAULT_MODEL);
        let comm_id = self
            .tracker
            .start(self.identity.session(AgentFramework::Crewai, model));

        let started = Instant::now();
        self.tracker.add_message(
            &comm_id,
            MessageDraft::user(prompt).tokens(estimate_tokens(prompt)),
        );

        match self.inner.call(prompt).await {
            Ok(response) => {
                self.tracker.add_message(
                    &comm_id,
                    MessageDraft::assistant(response.as_str()).tokens(estimate_tokens(&response)),
                );
                self.tracker.complete(
                    &comm_id,
                    Completion::success(response.as_str(), elapsed_ms(started)),
                );
                Ok(response)
            }
            Err(err) => {
                let classification = classify(&err);
                tracing::error!(
                    agent_name = %self.identity.agent_name,
                    "CrewAI LLM communication failed: {} ({:?}) - {}",
                    classification.error_type,
                    classification.error_code,
                    classification.message
                );
                self.tracker.complete(
                    &comm_id,
                    Completion::failure("", elapsed_ms(started), classification),
                );
                Err(err)
            }
        }
    }
}
