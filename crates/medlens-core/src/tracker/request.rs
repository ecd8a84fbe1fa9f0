//! Request types for starting and completing tracked sessions.

use crate::classifier::{ErrorClassification, ErrorKind};
use crate::communication::{
    AgentFramework, Communication, DEFAULT_SCENARIO_TYPE, LlmProvider,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Identity and context of a new tracked session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStart {
    pub agent_id: String,
    pub agent_name: String,
    pub agent_specialty: String,
    pub framework: AgentFramework,
    pub provider: LlmProvider,
    pub model: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default = "default_scenario_type")]
    pub scenario_type: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_scenario_type() -> String {
    DEFAULT_SCENARIO_TYPE.to_string()
}

impl SessionStart {
    pub fn new(
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        agent_specialty: impl Into<String>,
        framework: AgentFramework,
        provider: LlmProvider,
        model: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            agent_specialty: agent_specialty.into(),
            framework,
            provider,
            model: model.into(),
            patient_id: None,
            patient_name: None,
            scenario_type: default_scenario_type(),
            system_prompt: None,
        }
    }

    pub fn patient_id(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    pub fn patient_name(mut self, patient_name: impl Into<String>) -> Self {
        self.patient_name = Some(patient_name.into());
        self
    }

    pub fn scenario_type(mut self, scenario_type: impl Into<String>) -> Self {
        self.scenario_type = scenario_type.into();
        self
    }

    pub fn system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    pub(crate) fn into_communication(self, id: String) -> Communication {
        Communication {
            id,
            agent_id: self.agent_id,
            agent_name: self.agent_name,
            agent_specialty: self.agent_specialty,
            framework: self.framework,
            provider: self.provider,
            model: self.model,
            session_start: Utc::now(),
            session_end: None,
            patient_id: self.patient_id,
            patient_name: self.patient_name,
            scenario_type: self.scenario_type,
            messages: Vec::new(),
            system_prompt: self.system_prompt,
            total_input_tokens: 0,
            total_output_tokens: 0,
            total_tokens: 0,
            cost_estimate: 0.0,
            response_time_ms: 0,
            final_response: None,
            confidence_score: None,
            function_calls_made: Vec::new(),
            tools_used: Vec::new(),
            error_message: None,
            error_type: None,
            error_code: None,
            retry_count: 0,
        }
    }
}

/// Outcome of a tracked session, successful or failed.
///
/// Completion is the single finalization point for both outcomes; a failure is
/// a completion with the error fields populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub final_response: String,
    pub response_time_ms: u64,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error_type: Option<ErrorKind>,
    #[serde(default)]
    pub error_code: Option<u16>,
    #[serde(default)]
    pub retry_count: u32,
}

impl Completion {
    pub fn success(final_response: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            final_response: final_response.into(),
            response_time_ms,
            confidence_score: None,
            error_message: None,
            error_type: None,
            error_code: None,
            retry_count: 0,
        }
    }

    /// A failed completion carrying a classified upstream error.
    pub fn failure(
        final_response: impl Into<String>,
        response_time_ms: u64,
        classification: ErrorClassification,
    ) -> Self {
        Self {
            error_message: Some(classification.message),
            error_type: Some(classification.error_type),
            error_code: classification.error_code,
            ..Self::success(final_response, response_time_ms)
        }
    }

    pub fn with_confidence(mut self, confidence_score: f64) -> Self {
        self.confidence_score = Some(confidence_score);
        self
    }

    /// Records an error message without a classification.
    pub fn with_error_message(mut self, error_message: impl Into<String>) -> Self {
        self.error_message = Some(error_message.into());
        self
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify_message;

    #[test]
    fn test_start_defaults() {
        let start = SessionStart::new(
            "a1",
            "Dr. X",
            "cardiology",
            AgentFramework::Autogen,
            LlmProvider::OpenAi,
            "gpt-4",
        );
        assert_eq!(start.scenario_type, "assessment");
        assert!(start.patient_id.is_none());

        let comm = start.patient_id("p1").into_communication("comm_1".into());
        assert_eq!(comm.patient_id.as_deref(), Some("p1"));
        assert!(comm.messages.is_empty());
        assert!(!comm.is_completed());
    }

    #[test]
    fn test_failure_copies_classification() {
        let completion = Completion::failure(
            "Error: quota",
            120,
            classify_message("insufficient_quota", None),
        )
        .with_retry_count(2);

        assert_eq!(completion.error_type, Some(ErrorKind::QuotaExceeded));
        assert_eq!(completion.error_code, Some(429));
        assert_eq!(completion.error_message.as_deref(), Some("insufficient_quota"));
        assert_eq!(completion.retry_count, 2);
    }
}
