//! Tracked communication domain model.

use super::message::{Message, Role};
use crate::classifier::ErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default scenario recorded when the caller does not name one.
pub const DEFAULT_SCENARIO_TYPE: &str = "assessment";

/// Agent orchestration library that produced a tracked call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentFramework {
    Autogen,
    Crewai,
    Custom,
}

impl AgentFramework {
    /// Every framework, in reporting order.
    pub const ALL: [AgentFramework; 3] = [Self::Autogen, Self::Crewai, Self::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Autogen => "autogen",
            Self::Crewai => "crewai",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for AgentFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AgentFramework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "autogen" => Ok(Self::Autogen),
            "crewai" => Ok(Self::Crewai),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown agent framework: {other}")),
        }
    }
}

/// LLM API vendor, used for pricing lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LlmProvider {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "azure_openai")]
    AzureOpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "huggingface")]
    HuggingFace,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::AzureOpenAi => "azure_openai",
            Self::Anthropic => "anthropic",
            Self::HuggingFace => "huggingface",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "azure_openai" | "azure-openai" | "azure" => Ok(Self::AzureOpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "huggingface" => Ok(Self::HuggingFace),
            other => Err(format!("unknown LLM provider: {other}")),
        }
    }
}

/// One tracked LLM session.
///
/// A communication is created by [`crate::tracker::CommunicationTracker::start`],
/// grows through `add_message`, and is finalized exactly once by `complete`.
/// After completion it is never modified again.
///
/// `total_tokens` is always `total_input_tokens + total_output_tokens`, and
/// `cost_estimate` stays `0.0` until completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Communication {
    pub id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub agent_specialty: String,
    pub framework: AgentFramework,
    pub provider: LlmProvider,
    pub model: String,
    pub session_start: DateTime<Utc>,
    pub session_end: Option<DateTime<Utc>>,
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub scenario_type: String,

    pub messages: Vec<Message>,
    pub system_prompt: Option<String>,

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
    /// HTTP status code of the upstream failure, when known.
    pub error_code: Option<u16>,
    pub retry_count: u32,
}

impl Communication {
    pub fn is_completed(&self) -> bool {
        self.session_end.is_some()
    }

    /// True when the session finished with a non-empty error message.
    pub fn has_error(&self) -> bool {
        self.error_message
            .as_deref()
            .is_some_and(|message| !message.is_empty())
    }

    /// Wall-clock seconds between start and end, or `0.0` while still open.
    pub fn duration_seconds(&self) -> f64 {
        match self.session_end {
            Some(end) => (end - self.session_start).num_milliseconds() as f64 / 1000.0,
            None => 0.0,
        }
    }

    /// Appends a message and updates token and call bookkeeping.
    pub(crate) fn record_message(&mut self, message: Message) {
        if let Some(tokens) = message.tokens {
            // Function results count toward neither bucket.
            match message.role {
                Role::User | Role::System => {
                    self.total_input_tokens = self.total_input_tokens.saturating_add(tokens)
                }
                Role::Assistant => {
                    self.total_output_tokens = self.total_output_tokens.saturating_add(tokens)
                }
                Role::Function => {}
            }
            self.total_tokens = self
                .total_input_tokens
                .saturating_add(self.total_output_tokens);
        }

        if let Some(call) = &message.function_call {
            self.function_calls_made
                .push(call.display_name().to_string());
        }

        if let Some(tool_calls) = &message.tool_calls {
            self.tools_used
                .extend(tool_calls.iter().map(|call| call.display_name().to_string()));
        }

        self.messages.push(message);
    }
}

/// Generates an opaque id of the form `<prefix>_<unix-seconds>_<hex>`.
///
/// The random suffix comes from a v4 UUID, so ids do not collide across
/// concurrent callers within the same second.
pub(crate) fn generate_id(prefix: &str, suffix_len: usize) -> String {
    let random = Uuid::new_v4().simple().to_string();
    let suffix_len = suffix_len.min(random.len());
    format!("{}_{}_{}", prefix, Utc::now().timestamp(), &random[..suffix_len])
}
