//! Provider-neutral chat model abstraction.
//!
//! Agents talk to hosted models through [`ChatModel`], exchanging a small
//! message vocabulary (text, tool use, tool result) that each backend maps
//! onto its own wire format.

mod bedrock;
mod openai;

pub use bedrock::{document_to_json, json_to_document, BedrockModel};
pub use openai::OpenAiModel;

use crate::config::{ModelSettings, Provider};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// A user message holding a single text block.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// An assistant message holding a single text block.
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// The first text block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// All tool use blocks as `(id, name, input)`.
    pub fn tool_uses(&self) -> Vec<(&str, &str, &serde_json::Value)> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.as_str(), name.as_str(), input))
                }
                _ => None,
            })
            .collect()
    }

    /// Whether this message carries tool results back to the model.
    pub fn is_tool_result(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolResult { .. }))
    }
}

/// Tool description advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's arguments.
    pub input_schema: serde_json::Value,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::EndTurn => write!(f, "end_turn"),
            StopReason::ToolUse => write!(f, "tool_use"),
            StopReason::MaxTokens => write!(f, "max_tokens"),
            StopReason::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// A single model response.
#[derive(Debug, Clone)]
pub struct ModelTurn {
    pub message: Message,
    pub stop_reason: StopReason,
}

/// Generation parameters shared by all backends.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InferenceParams {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// A hosted chat model that supports tool calling.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Identifier of the underlying model.
    fn model_id(&self) -> &str;

    /// Send the conversation and return the model's next turn.
    async fn converse(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelTurn>;
}

/// Inference parameters for the resolved provider.
///
/// Azure deployments fall back to the parameters of
/// [`ModelSettings::azure_default`] for anything left unset.
pub fn inference_params(settings: &ModelSettings) -> InferenceParams {
    let (provider, _) = settings.resolve();
    let mut params = InferenceParams {
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
    };
    if provider == Provider::Azure {
        let preset = ModelSettings::azure_default();
        params.max_tokens = params.max_tokens.or(preset.max_tokens);
        params.temperature = params.temperature.or(preset.temperature);
    }
    params
}

/// Build the model backend described by settings.
pub async fn from_settings(settings: &ModelSettings) -> Result<Arc<dyn ChatModel>> {
    let (provider, model) = settings.resolve();
    let params = inference_params(settings);
    let timeout = Duration::from_secs(settings.timeout_secs);

    tracing::info!("Using {} model {}", provider, model);

    let backend: Arc<dyn ChatModel> = match provider {
        Provider::Bedrock => Arc::new(
            BedrockModel::from_env(&model, settings.region.as_deref(), params).await,
        ),
        Provider::Azure => {
            let client = crate::openai::create_azure_client(&model, timeout)?;
            Arc::new(OpenAiModel::new(client, &model, params))
        }
        Provider::OpenAi => {
            let client = crate::openai::create_client(settings.api_base.as_deref(), timeout)?;
            Arc::new(OpenAiModel::new(client, &model, params))
        }
    };

    Ok(backend)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted model for exercising agents without network access.

    use super::*;
    use crate::error::AgentHostError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A call observed by [`ScriptedModel`].
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub system: String,
        pub messages: Vec<Message>,
        pub tools: Vec<String>,
    }

    /// Replays queued turns in order and records every request.
    #[derive(Default)]
    pub struct ScriptedModel {
        turns: Mutex<VecDeque<Result<ModelTurn>>>,
        pub calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedModel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, text: &str) -> Self {
            self.push(Ok(ModelTurn {
                message: Message::assistant_text(text),
                stop_reason: StopReason::EndTurn,
            }))
        }

        pub fn tool_use(self, id: &str, name: &str, input: serde_json::Value) -> Self {
            self.push(Ok(ModelTurn {
                message: Message {
                    role: Role::Assistant,
                    content: vec![ContentBlock::ToolUse {
                        id: id.to_string(),
                        name: name.to_string(),
                        input,
                    }],
                },
                stop_reason: StopReason::ToolUse,
            }))
        }

        pub fn fail(self, message: &str) -> Self {
            self.push(Err(AgentHostError::Model(message.to_string())))
        }

        fn push(self, turn: Result<ModelTurn>) -> Self {
            self.turns.lock().unwrap().push_back(turn);
            self
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn converse(
            &self,
            system: &str,
            messages: &[Message],
            tools: &[ToolSpec],
        ) -> Result<ModelTurn> {
            self.calls.lock().unwrap().push(RecordedCall {
                system: system.to_string(),
                messages: messages.to_vec(),
                tools: tools.iter().map(|t| t.name.clone()).collect(),
            });
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentHostError::Model("script exhausted".to_string())))
        }
    }
}
