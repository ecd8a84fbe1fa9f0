//! Message types recorded inside a tracked communication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a message author in an LLM exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt or instruction.
    System,
    /// Message sent to the model.
    User,
    /// Model reply.
    Assistant,
    /// Result of a function invocation fed back to the model.
    Function,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Function => "function",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A function call descriptor attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl FunctionCall {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            arguments: None,
        }
    }

    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }

    /// Name used for bookkeeping; `"unknown"` when the descriptor carries none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unknown")
    }
}

/// A tool call descriptor in the OpenAI `tool_calls` shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionCall>,
}

impl ToolCall {
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            id: None,
            kind: Some("function".to_string()),
            function: Some(FunctionCall::named(name)),
        }
    }

    /// Name of the nested function, or `"unknown"`.
    pub fn display_name(&self) -> &str {
        self.function
            .as_ref()
            .map(FunctionCall::display_name)
            .unwrap_or("unknown")
    }
}

/// One turn of a tracked conversation.
///
/// Messages are created by the tracker and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub content: String,
    pub tokens: Option<u64>,
    pub function_call: Option<FunctionCall>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// Caller-supplied content for a new message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    pub role: Role,
    pub content: String,
    pub tokens: Option<u64>,
    pub function_call: Option<FunctionCall>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl MessageDraft {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tokens: None,
            function_call: None,
            tool_calls: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn tokens(mut self, tokens: u64) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn function_call(mut self, call: FunctionCall) -> Self {
        self.function_call = Some(call);
        self
    }

    pub fn tool_calls(mut self, calls: Vec<ToolCall>) -> Self {
        self.tool_calls = Some(calls);
        self
    }

    pub(crate) fn into_message(self, id: String, timestamp: DateTime<Utc>) -> Message {
        Message {
            id,
            timestamp,
            role: self.role,
            content: self.content,
            tokens: self.tokens,
            function_call: self.function_call,
            tool_calls: self.tool_calls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unnamed_calls_report_unknown() {
        assert_eq!(FunctionCall::default().display_name(), "unknown");
        assert_eq!(ToolCall::default().display_name(), "unknown");
        assert_eq!(ToolCall::function("search_fhir").display_name(), "search_fhir");
    }

    #[test]
    fn test_tool_call_uses_openai_field_names() {
        let json = serde_json::to_value(ToolCall::function("get_patient")).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "get_patient");
    }
}
