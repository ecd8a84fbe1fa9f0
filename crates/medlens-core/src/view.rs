//! camelCase read models for HTTP consumers.

use crate::classifier::ErrorKind;
use crate::communication::{
    AgentFramework, Communication, FunctionCall, LlmProvider, Message, Role, ToolCall,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub content: String,
    pub tokens: Option<u64>,
    pub function_call: Option<FunctionCall>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            timestamp: message.timestamp,
            role: message.role,
            content: message.content.clone(),
            tokens: message.tokens,
            function_call: message.function_call.clone(),
            tool_calls: message.tool_calls.clone(),
        }
    }
}

/// Full listing view of a communication.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationView {
    pub id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub framework: AgentFramework,
    pub provider: LlmProvider,
    pub model: String,
    pub session_start: DateTime<Utc>,
    pub session_end: Option<DateTime<Utc>>,
    pub patient_id: Option<String>,
    pub scenario_type: String,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    pub cost_estimate: f64,
    pub response_time_ms: u64,
    pub final_response: Option<String>,
    pub confidence_score: Option<f64>,
    pub function_calls_made: Vec<String>,
    pub tools_used: Vec<String>,
    pub error_message: Option<String>,
    pub error_type: Option<ErrorKind>,
    pub error_code: Option<u16>,
    pub retry_count: u32,
    pub messages: Vec<MessageView>,
}

impl From<&Communication> for CommunicationView {
    fn from(comm: &Communication) -> Self {
        Self {
            id: comm.id.clone(),
            agent_id: comm.agent_id.clone(),
            agent_name: comm.agent_name.clone(),
            framework: comm.framework,
            provider: comm.provider,
            model: comm.model.clone(),
            session_start: comm.session_start,
            session_end: comm.session_end,
            patient_id: comm.patient_id.clone(),
            scenario_type: comm.scenario_type.clone(),
            total_input_tokens: comm.total_input_tokens,
            total_output_tokens: comm.total_output_tokens,
            total_tokens: comm.total_tokens,
            cost_estimate: comm.cost_estimate,
            response_time_ms: comm.response_time_ms,
            final_response: comm.final_response.clone(),
            confidence_score: comm.confidence_score,
            function_calls_made: comm.function_calls_made.clone(),
            tools_used: comm.tools_used.clone(),
            error_message: comm.error_message.clone(),
            error_type: comm.error_type,
            error_code: comm.error_code,
            retry_count: comm.retry_count,
            messages: comm.messages.iter().map(MessageView::from).collect(),
        }
    }
}

/// Compact detail view served for a single communication lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationSummaryView {
    pub id: String,
    pub agent_name: String,
    pub framework: AgentFramework,
    pub model: String,
    pub session_start: DateTime<Utc>,
    pub session_end: Option<DateTime<Utc>>,
    pub total_tokens: u64,
    pub cost_estimate: f64,
    pub response_time_ms: u64,
    pub final_response: Option<String>,
    pub messages: Vec<MessageView>,
}

impl From<&Communication> for CommunicationSummaryView {
    fn from(comm: &Communication) -> Self {
        Self {
            id: comm.id.clone(),
            agent_name: comm.agent_name.clone(),
            framework: comm.framework,
            model: comm.model.clone(),
            session_start: comm.session_start,
            session_end: comm.session_end,
            total_tokens: comm.total_tokens,
            cost_estimate: comm.cost_estimate,
            response_time_ms: comm.response_time_ms,
            final_response: comm.final_response.clone(),
            messages: comm.messages.iter().map(MessageView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::MessageDraft;
    use crate::tracker::{CommunicationTracker, Completion, SessionStart};

    #[test]
    fn test_view_uses_camel_case_keys() {
        let tracker = CommunicationTracker::new();
        let comm_id = tracker.start(
            SessionStart::new(
                "a1",
                "Dr. X",
                "cardiology",
                AgentFramework::Crewai,
                LlmProvider::OpenAi,
                "gpt-4",
            )
            .patient_id("p1"),
        );
        tracker.add_message(
            &comm_id,
            MessageDraft::assistant("calling tool")
                .tool_calls(vec![ToolCall::function("get_patient")]),
        );
        tracker.complete(&comm_id, Completion::success("calling tool", 42));

        let comm = tracker.get_communication(&comm_id).unwrap();
        let json = serde_json::to_value(CommunicationView::from(&comm)).unwrap();

        for key in [
            "agentId",
            "agentName",
            "sessionStart",
            "sessionEnd",
            "patientId",
            "scenarioType",
            "totalInputTokens",
            "costEstimate",
            "responseTimeMs",
            "functionCallsMade",
            "toolsUsed",
            "errorType",
            "retryCount",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["framework"], "crewai");
        assert_eq!(json["messages"][0]["role"], "assistant");
        assert_eq!(json["messages"][0]["toolCalls"][0]["function"]["name"], "get_patient");

        let summary = serde_json::to_value(CommunicationSummaryView::from(&comm)).unwrap();
        assert_eq!(summary["responseTimeMs"], 42);
        assert!(summary.get("agentId").is_none());
    }
}
