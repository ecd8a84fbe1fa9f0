//! Shared plumbing for the framework adapters.

use medlens_core::communication::{AgentFramework, LlmProvider};
use medlens_core::tracker::SessionStart;
use std::time::Instant;

/// Identity under which a wrapped agent is tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    pub agent_id: String,
    pub agent_name: String,
    pub specialty: String,
}

impl AgentIdentity {
    pub fn new(
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        specialty: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            specialty: specialty.into(),
        }
    }

    /// Both adapters target OpenAI-compatible backends.
    pub(crate) fn session(&self, framework: AgentFramework, model: &str) -> SessionStart {
        SessionStart::new(
            self.agent_id.as_str(),
            self.agent_name.as_str(),
            self.specialty.as_str(),
            framework,
            LlmProvider::OpenAi,
            model,
        )
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
