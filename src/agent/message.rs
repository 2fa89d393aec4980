//! Conversation messages exchanged with the model.

use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    /// Opaque id pairing the call with its result.
    pub id: String,
    pub name: String,
    /// Arguments as the JSON text the model produced.
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// One entry in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Assistant message carrying tool calls, with any text the model sent alongside.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Result of a tool call; `content` is the JSON-serialized return value.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Whether this is a plain user or assistant text message.
    ///
    /// Only these are accepted as history from outside the process.
    pub fn is_conversational(&self) -> bool {
        matches!(self.role, Role::User | Role::Assistant)
            && self.tool_calls.is_empty()
            && self.tool_call_id.is_none()
            && self.content.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_chat_history() {
        let history: Vec<Message> = serde_json::from_value(json!([
            {"role": "user", "content": "Hi"},
            {"role": "assistant", "content": "Hello! How can I help?"}
        ]))
        .unwrap();
        assert_eq!(history, vec![Message::user("Hi"), Message::assistant("Hello! How can I help?")]);
    }

    #[test]
    fn test_serialize_skips_empty_fields() {
        let value = serde_json::to_value(Message::user("Hi")).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "Hi"}));

        let value = serde_json::to_value(Message::tool_result("call_1", "true")).unwrap();
        assert_eq!(value, json!({"role": "tool", "content": "true", "tool_call_id": "call_1"}));
    }

    #[test]
    fn test_is_conversational() {
        assert!(Message::user("Hi").is_conversational());
        assert!(Message::assistant("Hello").is_conversational());
        assert!(!Message::system("secret").is_conversational());
        assert!(!Message::tool_result("call_1", "{}").is_conversational());
        assert!(!Message::assistant_tool_calls(
            None,
            vec![ToolCall::new("call_1", "filter_products", "{}")]
        )
        .is_conversational());
    }
}
