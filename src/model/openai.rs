//! OpenAI-compatible chat completions backend (OpenAI, Azure OpenAI).

use super::{
    ChatModel, ContentBlock, InferenceParams, Message, ModelTurn, Role, StopReason, ToolSpec,
};
use crate::error::{AgentHostError, Result};
use async_openai::config::Config;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FinishReason,
    FunctionCall, FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::debug;

/// Chat model served through the chat completions API.
pub struct OpenAiModel<C: Config> {
    client: Client<C>,
    model: String,
    params: InferenceParams,
}

impl<C: Config> OpenAiModel<C> {
    pub fn new(client: Client<C>, model: &str, params: InferenceParams) -> Self {
        Self {
            client,
            model: model.to_string(),
            params,
        }
    }
}

fn build_err(e: impl std::fmt::Display) -> AgentHostError {
    AgentHostError::Model(e.to_string())
}

/// Convert the neutral conversation into chat completion messages.
fn to_request_messages(
    system: &str,
    messages: &[Message],
) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut out: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(messages.len() + 1);

    if !system.is_empty() {
        out.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system.to_string())
                .build()
                .map_err(build_err)?
                .into(),
        );
    }

    for message in messages {
        match message.role {
            Role::User => {
                let mut text = Vec::new();
                for block in &message.content {
                    match block {
                        ContentBlock::Text { text: t } => text.push(t.as_str()),
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            ..
                        } => out.push(
                            ChatCompletionRequestToolMessageArgs::default()
                                .tool_call_id(tool_use_id.as_str())
                                .content(content.clone())
                                .build()
                                .map_err(build_err)?
                                .into(),
                        ),
                        ContentBlock::ToolUse { .. } => {}
                    }
                }
                if !text.is_empty() {
                    out.push(
                        ChatCompletionRequestUserMessageArgs::default()
                            .content(text.join("\n"))
                            .build()
                            .map_err(build_err)?
                            .into(),
                    );
                }
            }
            Role::Assistant => {
                let text: Vec<&str> = message
                    .content
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                let tool_calls: Vec<ChatCompletionMessageToolCall> = message
                    .tool_uses()
                    .into_iter()
                    .map(|(id, name, input)| ChatCompletionMessageToolCall {
                        id: id.to_string(),
                        r#type: ChatCompletionToolType::Function,
                        function: FunctionCall {
                            name: name.to_string(),
                            arguments: input.to_string(),
                        },
                    })
                    .collect();

                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                if !text.is_empty() {
                    args.content(text.join("\n"));
                }
                if !tool_calls.is_empty() {
                    args.tool_calls(tool_calls);
                }
                out.push(args.build().map_err(build_err)?.into());
            }
        }
    }

    Ok(out)
}

fn to_tools(tools: &[ToolSpec]) -> Vec<ChatCompletionTool> {
    tools
        .iter()
        .map(|tool| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                parameters: Some(tool.input_schema.clone()),
                strict: None,
            },
        })
        .collect()
}

/// Parse function-call arguments, keeping malformed JSON as a string so the
/// tool layer can report it back to the model.
fn parse_arguments(arguments: &str) -> serde_json::Value {
    if arguments.trim().is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(arguments)
        .unwrap_or_else(|_| serde_json::Value::String(arguments.to_string()))
}

#[async_trait]
impl<C: Config + Send + Sync> ChatModel for OpenAiModel<C> {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn converse(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelTurn> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(to_request_messages(system, messages)?);
        if !tools.is_empty() {
            args.tools(to_tools(tools));
        }
        if let Some(max_tokens) = self.params.max_tokens {
            #[allow(deprecated)]
            args.max_tokens(max_tokens);
        }
        if let Some(temperature) = self.params.temperature {
            args.temperature(temperature);
        }
        let request = args.build().map_err(build_err)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentHostError::Model(format!("Chat completion failed: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentHostError::Model("No response from model".to_string()))?;

        debug!("Finish reason: {:?}", choice.finish_reason);

        let mut content = Vec::new();
        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            content.push(ContentBlock::Text { text });
        }
        for call in choice.message.tool_calls.unwrap_or_default() {
            content.push(ContentBlock::ToolUse {
                id: call.id,
                input: parse_arguments(&call.function.arguments),
                name: call.function.name,
            });
        }

        let stop_reason = match choice.finish_reason {
            Some(FinishReason::ToolCalls) | Some(FinishReason::FunctionCall) => StopReason::ToolUse,
            Some(FinishReason::Length) => StopReason::MaxTokens,
            Some(FinishReason::ContentFilter) => StopReason::Other("content_filter".to_string()),
            _ if content.iter().any(|b| matches!(b, ContentBlock::ToolUse { .. })) => {
                StopReason::ToolUse
            }
            _ => StopReason::EndTurn,
        };

        Ok(ModelTurn {
            message: Message {
                role: Role::Assistant,
                content,
            },
            stop_reason,
        })
    }
}
