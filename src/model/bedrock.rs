//! Amazon Bedrock backend using the Converse API.

use super::{
    ChatModel, ContentBlock, InferenceParams, Message, ModelTurn, Role, StopReason, ToolSpec,
};
use crate::error::{AgentHostError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_bedrockruntime::config::Region;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::types as bedrock;
use aws_sdk_bedrockruntime::Client;
use aws_smithy_types::{Document, Number};
use std::collections::HashMap;
use tracing::debug;

/// Chat model hosted on Amazon Bedrock.
pub struct BedrockModel {
    client: Client,
    model_id: String,
    params: InferenceParams,
}

impl BedrockModel {
    pub fn new(client: Client, model_id: &str, params: InferenceParams) -> Self {
        Self {
            client,
            model_id: model_id.to_string(),
            params,
        }
    }

    /// Build a client from the default AWS credential chain.
    pub async fn from_env(model_id: &str, region: Option<&str>, params: InferenceParams) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;
        Self::new(Client::new(&config), model_id, params)
    }
}

fn build_err(e: impl std::fmt::Display) -> AgentHostError {
    AgentHostError::Model(format!("Invalid Bedrock request: {}", e))
}

/// Convert JSON into a Smithy document.
pub fn json_to_document(value: &serde_json::Value) -> Document {
    match value {
        serde_json::Value::Null => Document::Null,
        serde_json::Value::Bool(b) => Document::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Document::Number(Number::PosInt(u))
            } else if let Some(i) = n.as_i64() {
                Document::Number(Number::NegInt(i))
            } else {
                Document::Number(Number::Float(n.as_f64().unwrap_or_default()))
            }
        }
        serde_json::Value::String(s) => Document::String(s.clone()),
        serde_json::Value::Array(items) => {
            Document::Array(items.iter().map(json_to_document).collect())
        }
        serde_json::Value::Object(map) => Document::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_document(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

/// Convert a Smithy document into JSON. Non-finite floats become null.
pub fn document_to_json(document: &Document) -> serde_json::Value {
    match document {
        Document::Null => serde_json::Value::Null,
        Document::Bool(b) => serde_json::Value::Bool(*b),
        Document::Number(Number::PosInt(u)) => serde_json::Value::from(*u),
        Document::Number(Number::NegInt(i)) => serde_json::Value::from(*i),
        Document::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Document::String(s) => serde_json::Value::String(s.clone()),
        Document::Array(items) => {
            serde_json::Value::Array(items.iter().map(document_to_json).collect())
        }
        Document::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), document_to_json(v)))
                .collect(),
        ),
    }
}

fn to_bedrock_block(block: &ContentBlock) -> Result<bedrock::ContentBlock> {
    Ok(match block {
        ContentBlock::Text { text } => bedrock::ContentBlock::Text(text.clone()),
        ContentBlock::ToolUse { id, name, input } => bedrock::ContentBlock::ToolUse(
            bedrock::ToolUseBlock::builder()
                .tool_use_id(id)
                .name(name)
                .input(json_to_document(input))
                .build()
                .map_err(build_err)?,
        ),
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => {
            let status = if *is_error {
                bedrock::ToolResultStatus::Error
            } else {
                bedrock::ToolResultStatus::Success
            };
            bedrock::ContentBlock::ToolResult(
                bedrock::ToolResultBlock::builder()
                    .tool_use_id(tool_use_id)
                    .content(bedrock::ToolResultContentBlock::Text(content.clone()))
                    .status(status)
                    .build()
                    .map_err(build_err)?,
            )
        }
    })
}

fn to_bedrock_messages(messages: &[Message]) -> Result<Vec<bedrock::Message>> {
    messages
        .iter()
        .map(|message| {
            let role = match message.role {
                Role::User => bedrock::ConversationRole::User,
                Role::Assistant => bedrock::ConversationRole::Assistant,
            };
            let content = message
                .content
                .iter()
                .map(to_bedrock_block)
                .collect::<Result<Vec<_>>>()?;
            bedrock::Message::builder()
                .role(role)
                .set_content(Some(content))
                .build()
                .map_err(build_err)
        })
        .collect()
}

/// Converse takes `maxTokens` as an i32.
fn max_tokens_param(max_tokens: Option<u32>) -> Result<Option<i32>> {
    max_tokens
        .map(|n| {
            i32::try_from(n).map_err(|_| {
                AgentHostError::Config(format!("max_tokens {} is out of range for Bedrock", n))
            })
        })
        .transpose()
}

fn to_tool_config(tools: &[ToolSpec]) -> Result<bedrock::ToolConfiguration> {
    let tools = tools
        .iter()
        .map(|tool| {
            bedrock::ToolSpecification::builder()
                .name(&tool.name)
                .description(&tool.description)
                .input_schema(bedrock::ToolInputSchema::Json(json_to_document(
                    &tool.input_schema,
                )))
                .build()
                .map(bedrock::Tool::ToolSpec)
                .map_err(build_err)
        })
        .collect::<Result<Vec<_>>>()?;

    bedrock::ToolConfiguration::builder()
        .set_tools(Some(tools))
        .build()
        .map_err(build_err)
}

fn from_bedrock_message(message: &bedrock::Message) -> Message {
    let content = message
        .content()
        .iter()
        .filter_map(|block| match block {
            bedrock::ContentBlock::Text(text) => Some(ContentBlock::Text { text: text.clone() }),
            bedrock::ContentBlock::ToolUse(tool_use) => Some(ContentBlock::ToolUse {
                id: tool_use.tool_use_id().to_string(),
                name: tool_use.name().to_string(),
                input: document_to_json(tool_use.input()),
            }),
            other => {
                debug!("Skipping unsupported content block: {:?}", other);
                None
            }
        })
        .collect();

    Message {
        role: Role::Assistant,
        content,
    }
}

fn from_stop_reason(reason: &bedrock::StopReason) -> StopReason {
    match reason {
        bedrock::StopReason::EndTurn | bedrock::StopReason::StopSequence => StopReason::EndTurn,
        bedrock::StopReason::ToolUse => StopReason::ToolUse,
        bedrock::StopReason::MaxTokens => StopReason::MaxTokens,
        other => StopReason::Other(other.as_str().to_string()),
    }
}

#[async_trait]
impl ChatModel for BedrockModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn converse(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelTurn> {
        let mut request = self
            .client
            .converse()
            .model_id(&self.model_id)
            .set_messages(Some(to_bedrock_messages(messages)?));

        if !system.is_empty() {
            request = request.system(bedrock::SystemContentBlock::Text(system.to_string()));
        }
        if !tools.is_empty() {
            request = request.tool_config(to_tool_config(tools)?);
        }
        if self.params != InferenceParams::default() {
            request = request.inference_config(
                bedrock::InferenceConfiguration::builder()
                    .set_max_tokens(max_tokens_param(self.params.max_tokens)?)
                    .set_temperature(self.params.temperature)
                    .build(),
            );
        }

        let response = request.send().await.map_err(|e| {
            AgentHostError::Model(format!("Bedrock converse failed: {}", DisplayErrorContext(e)))
        })?;

        let message = response
            .output()
            .and_then(|output| output.as_message().ok())
            .ok_or_else(|| AgentHostError::Model("No message in Bedrock response".to_string()))?;

        Ok(ModelTurn {
            message: from_bedrock_message(message),
            stop_reason: from_stop_reason(response.stop_reason()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_conversion_preserves_structure() {
        let value = serde_json::json!({
            "expression": "2 + 2",
            "limit": 5,
            "offset": -3,
            "ratio": 0.5,
            "flags": [true, null],
        });
        assert_eq!(document_to_json(&json_to_document(&value)), value);
    }

    #[test]
    fn test_max_tokens_range() {
        assert_eq!(max_tokens_param(None).unwrap(), None);
        assert_eq!(max_tokens_param(Some(32000)).unwrap(), Some(32000));
        assert!(matches!(
            max_tokens_param(Some(u32::MAX)),
            Err(AgentHostError::Config(_))
        ));
    }

    #[test]
    fn test_non_finite_float_becomes_null() {
        let doc = Document::Number(Number::Float(f64::NAN));
        assert_eq!(document_to_json(&doc), serde_json::Value::Null);
    }

    #[test]
    fn test_tool_result_message_maps_to_user_role() {
        let messages = vec![Message {
            role: Role::User,
            content: vec![ContentBlock::ToolResult {
                tool_use_id: "t1".to_string(),
                content: "boom".to_string(),
                is_error: true,
            }],
        }];

        let converted = to_bedrock_messages(&messages).unwrap();
        assert_eq!(converted[0].role(), &bedrock::ConversationRole::User);
        let result = converted[0].content()[0].as_tool_result().unwrap();
        assert_eq!(result.tool_use_id(), "t1");
        assert_eq!(result.status(), Some(&bedrock::ToolResultStatus::Error));
    }

    #[test]
    fn test_from_bedrock_message_reads_tool_use() {
        let message = bedrock::Message::builder()
            .role(bedrock::ConversationRole::Assistant)
            .content(bedrock::ContentBlock::Text("Let me check.".to_string()))
            .content(bedrock::ContentBlock::ToolUse(
                bedrock::ToolUseBlock::builder()
                    .tool_use_id("t9")
                    .name("weather")
                    .input(Document::Object(HashMap::new()))
                    .build()
                    .unwrap(),
            ))
            .build()
            .unwrap();

        let converted = from_bedrock_message(&message);
        assert_eq!(converted.first_text(), Some("Let me check."));
        let uses = converted.tool_uses();
        assert_eq!(uses[0].0, "t9");
        assert_eq!(uses[0].1, "weather");
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(
            from_stop_reason(&bedrock::StopReason::ToolUse),
            StopReason::ToolUse
        );
        assert_eq!(
            from_stop_reason(&bedrock::StopReason::GuardrailIntervened),
            StopReason::Other("guardrail_intervened".to_string())
        );
    }
}
