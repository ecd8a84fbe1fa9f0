//! Communication domain module.
//!
//! # Module Structure
//!
//! - `model`: Tracked session record (`Communication`) and its classification enums
//! - `message`: Conversation turns (`Message`, `Role`) and call descriptors

mod message;
mod model;

pub use message::{FunctionCall, Message, MessageDraft, Role, ToolCall};
pub use model::{AgentFramework, Communication, DEFAULT_SCENARIO_TYPE, LlmProvider};

pub(crate) use model::generate_id;
