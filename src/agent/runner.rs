//! Agent runner with tool calling loop.

use super::message::{Message, ToolCall};
use super::model::{ChatModel, ModelReply};
use super::tools::ToolRegistry;
use crate::error::{LuchError, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default cap on model calls per turn.
pub const DEFAULT_MAX_ROUNDS: usize = 8;

/// Default timeout for a single model call.
const DEFAULT_ROUND_TIMEOUT_SECS: u64 = 60;

/// What a model round asks the loop to do next.
enum RoundOutcome {
    /// Final text for the user.
    Answer(String),
    /// Tools to run before calling the model again.
    RunTools {
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
}

impl From<ModelReply> for RoundOutcome {
    fn from(reply: ModelReply) -> Self {
        if reply.wants_tools() {
            RoundOutcome::RunTools {
                content: reply.content,
                tool_calls: reply.tool_calls,
            }
        } else {
            RoundOutcome::Answer(reply.content.unwrap_or_default())
        }
    }
}

/// Drives the model/tool loop for one user turn at a time.
///
/// Holds no per-conversation state: history is owned by the caller and
/// passed in on every turn, so one agent can serve many conversations.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_rounds: usize,
    round_timeout: Duration,
}

impl Agent {
    /// Create a new agent with a model, tools, and the assembled system prompt.
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>, system_prompt: impl Into<String>) -> Self {
        Self {
            model,
            tools,
            system_prompt: system_prompt.into(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            round_timeout: Duration::from_secs(DEFAULT_ROUND_TIMEOUT_SECS),
        }
    }

    /// Set maximum model calls per turn.
    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max.max(1);
        self
    }

    /// Set the timeout for each model call.
    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = timeout;
        self
    }

    /// The system prompt sent at the start of every turn.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Answer a user message given the prior conversation.
    ///
    /// Every tool call the model makes gets exactly one result message, in
    /// request order, before the model is called again. Fails with
    /// `ToolLoopExceeded` when no plain answer arrives within `max_rounds`.
    pub async fn respond(&self, user_message: &str, history: &[Message]) -> Result<AgentResponse> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend_from_slice(history);
        messages.push(Message::user(user_message));

        let mut tool_calls_made = Vec::new();

        for round in 1..=self.max_rounds {
            debug!("Agent round {}, {} messages", round, messages.len());

            let reply = self.call_model(&messages).await?;
            if reply.finish_reason.is_truncated() {
                warn!(
                    "Model reply in round {} was cut short ({:?}), passing on what arrived",
                    round, reply.finish_reason
                );
            }

            match RoundOutcome::from(reply) {
                RoundOutcome::Answer(content) => {
                    info!("User message: {}, agent response: {}", user_message, content);
                    return Ok(AgentResponse {
                        content,
                        tool_calls: tool_calls_made,
                        rounds: round,
                    });
                }
                RoundOutcome::RunTools { content, tool_calls } => {
                    let mut results = Vec::with_capacity(tool_calls.len());
                    for call in &tool_calls {
                        let result = self.tools.execute(call).await?;
                        tool_calls_made.push(ToolCallRecord {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                            result: result.content.clone().unwrap_or_default(),
                        });
                        results.push(result);
                    }

                    messages.push(Message::assistant_tool_calls(content, tool_calls));
                    messages.extend(results);
                }
            }
        }

        Err(LuchError::ToolLoopExceeded {
            rounds: self.max_rounds,
        })
    }

    /// Call the model once, bounded by the round timeout.
    async fn call_model(&self, messages: &[Message]) -> Result<ModelReply> {
        tokio::time::timeout(
            self.round_timeout,
            self.model.complete(messages, self.tools.specs()),
        )
        .await
        .map_err(|_| LuchError::ModelTimeout(self.round_timeout.as_secs()))?
    }
}

/// Response from one agent turn.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during the turn.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of model calls used.
    pub rounds: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Serialized result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{sample_knowledge, RecordingNotifier, ScriptedModel, Step};
    use crate::agent::tools::{FILTER_PRODUCTS, SEND_NOTIFICATION};
    use crate::agent::{FinishReason, Role};
    use std::collections::HashSet;

    const PROMPT: &str = "You are Ava from Acme.";

    fn agent(model: Arc<ScriptedModel>, notifier: Arc<RecordingNotifier>) -> Agent {
        let tools = Arc::new(ToolRegistry::new(sample_knowledge(), notifier));
        Agent::new(model, tools, PROMPT)
    }

    /// Every tool call id is answered once, in order, before the next model call.
    fn assert_tool_results_paired(messages: &[Message]) {
        let mut i = 0;
        while i < messages.len() {
            let message = &messages[i];
            if message.role == Role::Assistant && !message.tool_calls.is_empty() {
                let results = &messages[i + 1..i + 1 + message.tool_calls.len()];
                for (call, result) in message.tool_calls.iter().zip(results) {
                    assert_eq!(result.role, Role::Tool);
                    assert_eq!(result.tool_call_id.as_deref(), Some(call.id.as_str()));
                }
                i += 1 + message.tool_calls.len();
            } else {
                assert_ne!(message.role, Role::Tool, "orphan tool result at {}", i);
                i += 1;
            }
        }
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "filter_products".to_string(),
            arguments: r#"{"name": "widget"}"#.to_string(),
            result: "[]".to_string(),
        };
        assert_eq!(format!("{}", record), r#"filter_products({"name": "widget"})"#);
    }

    #[tokio::test]
    async fn test_plain_answer_in_one_round() {
        let model = Arc::new(ScriptedModel::replies(vec![ModelReply::text("1")]));
        let notifier = Arc::new(RecordingNotifier::default());
        let history = vec![Message::user("Hi"), Message::assistant("Hello!")];

        let response = agent(model.clone(), notifier)
            .respond("Return the number 1.", &history)
            .await
            .unwrap();

        assert_eq!(response.content, "1");
        assert_eq!(response.rounds, 1);
        assert!(response.tool_calls.is_empty());

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0],
            vec![
                Message::system(PROMPT),
                Message::user("Hi"),
                Message::assistant("Hello!"),
                Message::user("Return the number 1."),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_content_becomes_empty_text() {
        let reply = ModelReply {
            content: None,
            ..ModelReply::text("")
        };
        let model = Arc::new(ScriptedModel::replies(vec![reply]));
        let response = agent(model, Arc::new(RecordingNotifier::default()))
            .respond("Hi", &[])
            .await
            .unwrap();
        assert_eq!(response.content, "");
    }

    #[tokio::test]
    async fn test_truncated_reply_is_still_answered() {
        let reply = ModelReply {
            finish_reason: FinishReason::Length,
            ..ModelReply::text("We sell widgets and")
        };
        let model = Arc::new(ScriptedModel::replies(vec![reply]));
        let response = agent(model.clone(), Arc::new(RecordingNotifier::default()))
            .respond("What do you sell?", &[])
            .await
            .unwrap();

        assert_eq!(response.content, "We sell widgets and");
        assert_eq!(response.rounds, 1);
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_tool_results_follow_calls_in_order() {
        let model = Arc::new(ScriptedModel::replies(vec![
            ModelReply::tool_calls(vec![
                ToolCall::new("call_a", FILTER_PRODUCTS, r#"{"name": "widget"}"#),
                ToolCall::new("call_b", "unknown_tool", "{}"),
                ToolCall::new("call_c", FILTER_PRODUCTS, r#"{"min_price": 40}"#),
            ]),
            ModelReply::tool_calls(vec![ToolCall::new("call_d", FILTER_PRODUCTS, "{}")]),
            ModelReply::text("We have two products."),
        ]));

        let response = agent(model.clone(), Arc::new(RecordingNotifier::default()))
            .respond("What do you sell?", &[])
            .await
            .unwrap();

        assert_eq!(response.content, "We have two products.");
        assert_eq!(response.rounds, 3);
        assert_eq!(response.tool_calls.len(), 4);
        assert_eq!(response.tool_calls[1].result, "{}");

        let requests = model.requests();
        assert_eq!(requests.len(), 3);
        for request in &requests {
            assert_tool_results_paired(request);
        }

        let last = &requests[2];
        assert_eq!(last.len(), 2 + 4 + 2);
        let ids: Vec<_> = last
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        assert_eq!(ids, vec!["call_a", "call_b", "call_c", "call_d"]);
        assert_eq!(
            last[5].content.as_deref(),
            Some(r#"[{"name":"Gadget","price":50}]"#)
        );

        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[tokio::test]
    async fn test_phone_number_triggers_one_notification() {
        let model = Arc::new(ScriptedModel::replies(vec![
            ModelReply::tool_calls(vec![ToolCall::new(
                "call_1",
                SEND_NOTIFICATION,
                r#"{"title": "New contact", "message": "User phone: 09123456789"}"#,
            )]),
            ModelReply::text("Thanks! I've passed your number to our team."),
        ]));
        let notifier = Arc::new(RecordingNotifier::default());

        let response = agent(model.clone(), notifier.clone())
            .respond("This is my number: 09123456789", &[])
            .await
            .unwrap();

        assert_eq!(
            notifier.sent(),
            vec![("New contact".to_string(), "User phone: 09123456789".to_string())]
        );
        assert!(response.content.contains("passed your number"));

        let last = model.requests().pop().unwrap();
        assert_eq!(last.last().unwrap(), &Message::tool_result("call_1", "true"));
    }

    #[tokio::test]
    async fn test_duplicate_calls_are_not_deduplicated() {
        let call = r#"{"title": "Lead", "message": "x"}"#;
        let model = Arc::new(ScriptedModel::replies(vec![
            ModelReply::tool_calls(vec![
                ToolCall::new("call_1", SEND_NOTIFICATION, call),
                ToolCall::new("call_2", SEND_NOTIFICATION, call),
            ]),
            ModelReply::text("Done."),
        ]));
        let notifier = Arc::new(RecordingNotifier::default());

        agent(model, notifier.clone()).respond("hi", &[]).await.unwrap();
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_notification_does_not_abort_turn() {
        let model = Arc::new(ScriptedModel::replies(vec![
            ModelReply::tool_calls(vec![ToolCall::new(
                "call_1",
                SEND_NOTIFICATION,
                r#"{"title": "Lead", "message": "x"}"#,
            )]),
            ModelReply::text("Sorry, please try again later."),
        ]));

        let response = agent(model.clone(), Arc::new(RecordingNotifier::failing()))
            .respond("hi", &[])
            .await
            .unwrap();

        assert_eq!(response.tool_calls[0].result, "false");
        assert_eq!(response.content, "Sorry, please try again later.");
    }

    #[tokio::test]
    async fn test_loop_cap_raises_tool_loop_exceeded() {
        let model = Arc::new(ScriptedModel::repeating(ModelReply::tool_calls(vec![
            ToolCall::new("call", FILTER_PRODUCTS, "{}"),
        ])));

        let err = agent(model.clone(), Arc::new(RecordingNotifier::default()))
            .with_max_rounds(3)
            .respond("loop forever", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, LuchError::ToolLoopExceeded { rounds: 3 }));
        assert_eq!(model.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_arguments_abort_turn() {
        let model = Arc::new(ScriptedModel::replies(vec![
            ModelReply::tool_calls(vec![ToolCall::new("call_1", FILTER_PRODUCTS, "{oops")]),
            ModelReply::text("unreachable"),
        ]));

        let err = agent(model.clone(), Arc::new(RecordingNotifier::default()))
            .respond("hi", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, LuchError::ToolArguments { .. }));
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_model_error_surfaces() {
        let model = Arc::new(ScriptedModel::new(vec![Step::Fail("connection refused".to_string())]));
        let err = agent(model, Arc::new(RecordingNotifier::default()))
            .respond("hi", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, LuchError::ModelUnavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_timeout() {
        let model = Arc::new(ScriptedModel::new(vec![Step::Hang]));
        let err = agent(model, Arc::new(RecordingNotifier::default()))
            .with_round_timeout(Duration::from_secs(5))
            .respond("hi", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, LuchError::ModelTimeout(5)));
    }
}
