//! Tool definitions and dispatch for the agent.

use super::message::{Message, ToolCall};
use crate::error::{LuchError, Result};
use crate::knowledge::{KnowledgeStore, ProductFilter};
use crate::notify::Notifier;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub const SEND_NOTIFICATION: &str = "send_notification";
pub const FILTER_PRODUCTS: &str = "filter_products";

/// Declaration of a tool advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// Arguments of `send_notification`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationArgs {
    pub title: String,
    pub message: String,
}

/// A resolved tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Tool {
    /// Tell the team about a lead or anything worth their attention.
    SendNotification(NotificationArgs),

    /// Look up products by name and/or price range.
    FilterProducts(ProductFilter),
}

/// Get the tool declarations advertised to the model.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: SEND_NOTIFICATION.to_string(),
            description: "Use this when you need to let the team know something by sending a \
                notification. For example, when a user wants to be contacted and shares their \
                phone number or email, or tells you something the team should hear about."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "The title of the notification"
                    },
                    "message": {
                        "type": "string",
                        "description": "The message of the notification"
                    }
                },
                "required": ["title", "message"],
                "additionalProperties": false
            }),
        },
        ToolSpec {
            name: FILTER_PRODUCTS.to_string(),
            description: "Use this to get information about products. Get them all, or find \
                them by name or by price range."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "The name of the product"
                    },
                    "min_price": {
                        "type": "integer",
                        "description": "The minimum price of the products"
                    },
                    "max_price": {
                        "type": "integer",
                        "description": "The maximum price of the products"
                    }
                },
                "additionalProperties": false
            }),
        },
    ]
}

/// Parse a tool call from the model's name and argument text.
///
/// Returns `Ok(None)` for a tool name nobody registered. Argument text that
/// is not JSON, or does not fit the tool, is an error.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<Option<Tool>> {
    let args: Value = if arguments.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(arguments).map_err(|source| LuchError::ToolArguments {
            tool: name.to_string(),
            source,
        })?
    };

    let typed = |source| LuchError::ToolArguments {
        tool: name.to_string(),
        source,
    };

    match name {
        SEND_NOTIFICATION => Ok(Some(Tool::SendNotification(
            serde_json::from_value(args).map_err(typed)?,
        ))),
        FILTER_PRODUCTS => Ok(Some(Tool::FilterProducts(
            serde_json::from_value(args).map_err(typed)?,
        ))),
        _ => Ok(None),
    }
}

/// Maps tool names to their handlers.
///
/// The set of tools is fixed when the registry is built.
pub struct ToolRegistry {
    knowledge: Arc<KnowledgeStore>,
    notifier: Arc<dyn Notifier>,
    specs: Vec<ToolSpec>,
}

impl ToolRegistry {
    /// Create a registry over the knowledge store and notifier.
    pub fn new(knowledge: Arc<KnowledgeStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            knowledge,
            notifier,
            specs: tool_specs(),
        }
    }

    /// Declarations to advertise to the model.
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Run a tool by name and return its result.
    ///
    /// Unknown names give an empty object so the conversation can go on.
    pub async fn dispatch(&self, name: &str, arguments: &str) -> Result<Value> {
        let Some(tool) = parse_tool_call(name, arguments)? else {
            warn!("Model requested unknown tool: {}", name);
            return Ok(json!({}));
        };

        info!("Tool called {} with arguments {}", name, arguments);

        let result = match tool {
            Tool::SendNotification(args) => {
                Value::Bool(self.notifier.notify(&args.title, &args.message).await)
            }
            Tool::FilterProducts(filter) => {
                serde_json::to_value(self.knowledge.filter_products(&filter))?
            }
        };

        Ok(result)
    }

    /// Run a tool call and wrap the serialized result as a tool message.
    pub async fn execute(&self, call: &ToolCall) -> Result<Message> {
        let result = self.dispatch(&call.name, &call.arguments).await?;
        Ok(Message::tool_result(&call.id, serde_json::to_string(&result)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{sample_knowledge, RecordingNotifier};
    use crate::agent::Role;

    fn registry(notifier: Arc<RecordingNotifier>) -> ToolRegistry {
        ToolRegistry::new(sample_knowledge(), notifier)
    }

    #[test]
    fn test_tool_specs() {
        let specs = tool_specs();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![SEND_NOTIFICATION, FILTER_PRODUCTS]);
        assert_eq!(specs[0].parameters["required"], json!(["title", "message"]));
        assert!(specs[1].parameters.get("required").is_none());
    }

    #[test]
    fn test_parse_notification_tool() {
        let tool = parse_tool_call(SEND_NOTIFICATION, r#"{"title": "Lead", "message": "Call me"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            tool,
            Tool::SendNotification(NotificationArgs {
                title: "Lead".to_string(),
                message: "Call me".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_filter_tool_with_blank_arguments() {
        let tool = parse_tool_call(FILTER_PRODUCTS, "  ").unwrap().unwrap();
        assert_eq!(tool, Tool::FilterProducts(ProductFilter::default()));
    }

    #[test]
    fn test_parse_unknown_tool() {
        assert!(parse_tool_call("delete_everything", "{}").unwrap().is_none());
    }

    #[test]
    fn test_parse_malformed_arguments() {
        let err = parse_tool_call(FILTER_PRODUCTS, "{\"name\": ").unwrap_err();
        assert!(matches!(err, LuchError::ToolArguments { ref tool, .. } if tool == FILTER_PRODUCTS));

        // Malformed JSON fails even when the name is unknown
        assert!(parse_tool_call("delete_everything", "not json").is_err());

        // Valid JSON with a missing required field
        assert!(parse_tool_call(SEND_NOTIFICATION, r#"{"title": "only"}"#).is_err());
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_returns_empty_object() {
        let notifier = Arc::new(RecordingNotifier::default());
        let result = registry(notifier.clone()).dispatch("lookup_weather", "{}").await.unwrap();
        assert_eq!(result, json!({}));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_filter_products() {
        let result = registry(Arc::new(RecordingNotifier::default()))
            .dispatch(FILTER_PRODUCTS, r#"{"name": "test", "min_price": 15, "max_price": 30}"#)
            .await
            .unwrap();
        assert_eq!(result, json!([{"name": "Test Widget", "price": 20}]));
    }

    #[tokio::test]
    async fn test_dispatch_notification_success_and_failure() {
        let notifier = Arc::new(RecordingNotifier::default());
        let result = registry(notifier.clone())
            .dispatch(SEND_NOTIFICATION, r#"{"title": "Lead", "message": "09123456789"}"#)
            .await
            .unwrap();
        assert_eq!(result, json!(true));
        assert_eq!(notifier.sent(), vec![("Lead".to_string(), "09123456789".to_string())]);

        let failing = Arc::new(RecordingNotifier::failing());
        let result = registry(failing)
            .dispatch(SEND_NOTIFICATION, r#"{"title": "Lead", "message": "x"}"#)
            .await
            .unwrap();
        assert_eq!(result, json!(false));
    }

    #[tokio::test]
    async fn test_execute_builds_tool_result() {
        let call = ToolCall::new("call_7", FILTER_PRODUCTS, r#"{"max_price": 30}"#);
        let message = registry(Arc::new(RecordingNotifier::default()))
            .execute(&call)
            .await
            .unwrap();

        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.tool_call_id.as_deref(), Some("call_7"));
        assert_eq!(message.content.as_deref(), Some(r#"[{"name":"Test Widget","price":20}]"#));
    }
}
