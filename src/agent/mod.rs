//! Agent system for answering customers with tool calling.
//!
//! The agent sends the conversation to a chat model, runs any tools the
//! model asks for (product lookup, team notifications), feeds the results
//! back, and repeats until the model produces a plain answer.

mod message;
mod model;
mod runner;
mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use message::{Message, Role, ToolCall};
pub use model::{ChatModel, FinishReason, ModelReply};
pub use runner::{Agent, AgentResponse, ToolCallRecord, DEFAULT_MAX_ROUNDS};
pub use tools::{
    parse_tool_call, tool_specs, NotificationArgs, Tool, ToolRegistry, ToolSpec,
    FILTER_PRODUCTS, SEND_NOTIFICATION,
};
