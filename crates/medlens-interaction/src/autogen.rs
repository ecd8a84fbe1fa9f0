//! Tracking decorator for AutoGen-style conversable agents.
//!
//! A conversable agent produces one reply from the conversation so far. The
//! decorator records the incoming conversation, times the reply and completes
//! the tracked communication with either the reply or the classified failure.

use crate::adapter::{AgentIdentity, elapsed_ms};
use crate::error::LlmCallError;
use async_trait::async_trait;
use medlens_core::communication::{AgentFramework, FunctionCall, MessageDraft, Role, ToolCall};
use medlens_core::tracker::Completion;
use medlens_core::{CommunicationTracker, classify};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

const UNKNOWN_MODEL: &str = "unknown";

/// One entry of the conversation handed to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Reply produced by an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub content: Option<String>,
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}

/// Reply-generating agent interface.
#[async_trait]
pub trait ReplyAgent: Send + Sync {
    /// Model the agent is configured with, if known.
    fn model(&self) -> Option<&str> {
        None
    }

    fn system_message(&self) -> Option<&str> {
        None
    }

    async fn generate_reply(&self, messages: &[ChatMessage]) -> Result<Reply, LlmCallError>;
}

/// [`ReplyAgent`] decorator that tracks every reply as one communication.
pub struct TrackedReplyAgent<A> {
    inner: A,
    tracker: Arc<CommunicationTracker>,
    identity: AgentIdentity,
}

impl<A: ReplyAgent> TrackedReplyAgent<A> {
    pub fn new(inner: A, tracker: Arc<CommunicationTracker>, identity: AgentIdentity) -> Self {
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
impl<A: ReplyAgent> ReplyAgent for TrackedReplyAgent<A> {
    fn model(&self) -> Option<&str> {
        self.inner.model()
    }

    fn system_message(&self) -> Option<&str> {
        self.inner.system_message()
    }

    async fn generate_reply(&self, messages: &[ChatMessage]) -> Result<Reply, LlmCallError> {
        let model = self.inner.model().unwrap_or(UNKNOWN_MODEL);
        let start = self
            .identity
            .session(AgentFramework::Autogen, model)
            .system_prompt(self.inner.system_message().map(str::to_string));
        let comm_id = self.tracker.start(start);

        for message in messages {
            self.tracker.add_message(
                &comm_id,
                MessageDraft::new(message.role, message.content.as_str()),
            );
        }

        let started = Instant::now();
        match self.inner.generate_reply(messages).await {
            Ok(reply) => {
                let content = reply.content_or_empty().to_string();
                let mut draft = MessageDraft::assistant(content.as_str());
                if let Some(call) = &reply.function_call {
                    draft = draft.function_call(call.clone());
                }
                if let Some(calls) = &reply.tool_calls {
                    draft = draft.tool_calls(calls.clone());
                }
                self.tracker.add_message(&comm_id, draft);
                self.tracker
                    .complete(&comm_id, Completion::success(content, elapsed_ms(started)));
                Ok(reply)
            }
            Err(err) => {
                let classification = classify(&err);
                tracing::error!(
                    agent_name = %self.identity.agent_name,
                    "AutoGen LLM communication failed: {} ({:?}) - {}",
                    classification.error_type,
                    classification.error_code,
                    classification.message
                );
                let final_response = format!("Error: {}", classification.message);
                self.tracker.complete(
                    &comm_id,
                    Completion::failure(final_response, elapsed_ms(started), classification)
                        .with_retry_count(err.retry_count()),
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medlens_core::ErrorKind;

    struct ScriptedAgent {
        model: Option<&'static str>,
        outcome: Result<Reply, LlmCallError>,
    }

    #[async_trait]
    impl ReplyAgent for ScriptedAgent {
        fn model(&self) -> Option<&str> {
            self.model
        }

        fn system_message(&self) -> Option<&str> {
            Some("You are a cardiologist.")
        }

        async fn generate_reply(&self, _messages: &[ChatMessage]) -> Result<Reply, LlmCallError> {
            self.outcome.clone()
        }
    }

    fn wrap(agent: ScriptedAgent) -> (Arc<CommunicationTracker>, TrackedReplyAgent<ScriptedAgent>) {
        let tracker = Arc::new(CommunicationTracker::new());
        let wrapped = TrackedReplyAgent::new(
            agent,
            Arc::clone(&tracker),
            AgentIdentity::new("cardio-1", "Dr. Heart", "cardiology"),
        );
        (tracker, wrapped)
    }

    #[tokio::test]
    async fn test_successful_reply_is_tracked() {
        let (tracker, agent) = wrap(ScriptedAgent {
            model: Some("gpt-4"),
            outcome: Ok(Reply::text("Order an ECG.")),
        });

        let reply = agent
            .generate_reply(&[
                ChatMessage::new(Role::System, "context"),
                ChatMessage::user("Patient has chest pain."),
            ])
            .await
            .unwrap();
        assert_eq!(reply.content.as_deref(), Some("Order an ECG."));

        let comms = tracker.communications();
        assert_eq!(comms.len(), 1);
        let comm = &comms[0];
        assert_eq!(comm.framework, AgentFramework::Autogen);
        assert_eq!(comm.model, "gpt-4");
        assert_eq!(comm.system_prompt.as_deref(), Some("You are a cardiologist."));
        assert_eq!(comm.messages.len(), 3);
        assert_eq!(comm.messages[2].role, Role::Assistant);
        assert!(comm.messages.iter().all(|m| m.tokens.is_none()));
        assert_eq!(comm.final_response.as_deref(), Some("Order an ECG."));
        assert!(comm.is_completed());
        assert!(tracker.active_session("cardio-1").is_none());
    }

    #[tokio::test]
    async fn test_failure_is_recorded_and_returned() {
        let failure =
            LlmCallError::api(Some(429), "Rate limit reached for gpt-4").with_retry_count(2);
        let (tracker, agent) = wrap(ScriptedAgent {
            model: None,
            outcome: Err(failure.clone()),
        });

        let err = agent
            .generate_reply(&[ChatMessage::user("hello")])
            .await
            .unwrap_err();
        assert_eq!(err, failure);

        let comm = tracker.communications().remove(0);
        assert_eq!(comm.model, "unknown");
        assert_eq!(comm.error_type, Some(ErrorKind::RateLimit));
        assert_eq!(comm.error_code, Some(429));
        assert_eq!(comm.retry_count, 2);
        assert_eq!(
            comm.final_response.as_deref(),
            Some("Error: Rate limit reached for gpt-4")
        );
    }

    #[tokio::test]
    async fn test_tool_calls_are_recorded() {
        let (tracker, agent) = wrap(ScriptedAgent {
            model: Some("gpt-4"),
            outcome: Ok(Reply {
                content: None,
                function_call: None,
                tool_calls: Some(vec![ToolCall::function("search_conditions")]),
            }),
        });

        agent.generate_reply(&[ChatMessage::user("history?")]).await.unwrap();

        let comm = tracker.communications().remove(0);
        assert_eq!(comm.tools_used, vec!["search_conditions"]);
        assert_eq!(comm.final_response.as_deref(), Some(""));
    }
}
