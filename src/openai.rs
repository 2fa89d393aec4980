//! OpenAI-compatible chat model client.

use crate::agent::{ChatModel, FinishReason, Message, ModelReply, Role, ToolCall, ToolSpec};
use crate::config::ModelSettings;
use crate::error::{LuchError, Result};
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Create an OpenAI client from the model settings.
///
/// Points at `base_url` when set, so any OpenAI-compatible provider works.
pub fn create_client(settings: &ModelSettings) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(settings, settings.request_timeout())
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(
    settings: &ModelSettings,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let mut config = OpenAIConfig::new();
    if let Some(key) = &settings.api_key {
        config = config.with_api_key(key);
    }
    if let Some(base_url) = &settings.base_url {
        config = config.with_api_base(base_url.trim_end_matches('/'));
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Chat model backed by the chat completions API.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIChatModel {
    /// Create a chat model from settings.
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, messages, tools), fields(model = %self.model, messages = messages.len()))]
    async fn complete(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<ModelReply> {
        let request_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(request_messages)
            .tools(tools.iter().map(to_openai_tool).collect::<Vec<_>>())
            .build()
            .map_err(build_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LuchError::ModelUnavailable(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LuchError::ModelUnavailable("No response from model".to_string()))?;

        let finish_reason = to_finish_reason(choice.finish_reason);
        debug!("Model finished with {:?}", finish_reason);

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall::new(call.id, call.function.name, call.function.arguments))
            .collect();

        Ok(ModelReply {
            content: choice.message.content,
            tool_calls,
            finish_reason,
        })
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn build_error(e: OpenAIError) -> LuchError {
    LuchError::Agent(format!("Failed to build model request: {}", e))
}

/// Convert a conversation message into the API request format.
fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
    let content = message.content.clone().unwrap_or_default();

    let request_message = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()
            .map_err(build_error)?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()
            .map_err(build_error)?
            .into(),
        Role::Assistant => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if let Some(text) = &message.content {
                args.content(text.clone());
            }
            if !message.tool_calls.is_empty() {
                args.tool_calls(
                    message
                        .tool_calls
                        .iter()
                        .map(to_openai_tool_call)
                        .collect::<Vec<_>>(),
                );
            }
            args.build().map_err(build_error)?.into()
        }
        Role::Tool => {
            let tool_call_id = message.tool_call_id.clone().ok_or_else(|| {
                LuchError::InvalidInput("tool message without tool_call_id".to_string())
            })?;
            ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(tool_call_id)
                .content(content)
                .build()
                .map_err(build_error)?
                .into()
        }
    };

    Ok(request_message)
}

fn to_openai_tool_call(call: &ToolCall) -> ChatCompletionMessageToolCall {
    ChatCompletionMessageToolCall {
        id: call.id.clone(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        },
    }
}

fn to_openai_tool(spec: &ToolSpec) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: spec.name.clone(),
            description: Some(spec.description.clone()),
            parameters: Some(spec.parameters.clone()),
            strict: None,
        },
    }
}

fn to_finish_reason(reason: Option<async_openai::types::FinishReason>) -> FinishReason {
    use async_openai::types::FinishReason as ApiFinishReason;

    match reason {
        Some(ApiFinishReason::Stop) => FinishReason::Stop,
        Some(ApiFinishReason::ToolCalls) | Some(ApiFinishReason::FunctionCall) => {
            FinishReason::ToolCalls
        }
        Some(ApiFinishReason::Length) => FinishReason::Length,
        Some(ApiFinishReason::ContentFilter) => FinishReason::ContentFilter,
        None => FinishReason::Unknown,
    }
}
