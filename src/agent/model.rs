//! Chat model abstraction.

use super::message::{Message, ToolCall};
use super::tools::ToolSpec;
use crate::error::Result;
use async_trait::async_trait;

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Length,
    ContentFilter,
    Unknown,
}

impl FinishReason {
    /// Whether the provider cut the reply short.
    pub fn is_truncated(&self) -> bool {
        matches!(self, FinishReason::Length | FinishReason::ContentFilter)
    }
}

/// One assistant message returned by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
}

impl ModelReply {
    /// A plain text answer.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
        }
    }

    /// A request to run tools.
    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
            finish_reason: FinishReason::ToolCalls,
        }
    }

    /// Whether the model asked for tools.
    ///
    /// Decided by the calls present, not the finish reason alone: some
    /// providers report `stop` next to tool calls, and a `tool_calls` reason
    /// with no calls has nothing to run.
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Trait for chat completion providers.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Complete a conversation, offering the given tools.
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<ModelReply>;

    /// Model name, for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wants_tools() {
        assert!(!ModelReply::text("hi").wants_tools());
        assert!(ModelReply::tool_calls(vec![ToolCall::new("1", "filter_products", "{}")]).wants_tools());

        let empty_calls = ModelReply {
            content: Some("done".to_string()),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::ToolCalls,
        };
        assert!(!empty_calls.wants_tools());
    }

    #[test]
    fn test_truncated_finish_reasons() {
        assert!(FinishReason::Length.is_truncated());
        assert!(FinishReason::ContentFilter.is_truncated());
        assert!(!FinishReason::Stop.is_truncated());
        assert!(!FinishReason::ToolCalls.is_truncated());
        assert!(!FinishReason::Unknown.is_truncated());
    }
}
