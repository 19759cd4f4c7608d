//! Invocation runtime.
//!
//! An [`Entrypoint`] turns a JSON payload into a text response. The same
//! entrypoint is driven either once from the command line or repeatedly by
//! the HTTP server in [`server`].

pub mod server;

pub use server::{router, serve, RuntimeState, SESSION_HEADER};

use crate::agent::{chat_agent, Agent};
use crate::config::{EntrypointKind, Prompts, Settings};
use crate::crew::{research_crew, topic_inputs, Crew};
use crate::error::{AgentHostError, Result};
use crate::model;
use async_trait::async_trait;
use std::sync::Arc;

/// Per-invocation metadata supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub session_id: String,
    pub request_id: String,
}

impl InvocationContext {
    /// A context with the given session and a fresh request id.
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::for_session(crate::agent::DEFAULT_SESSION)
    }
}

/// The function a hosting runtime calls with each payload.
#[async_trait]
pub trait Entrypoint: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn invoke(&self, payload: serde_json::Value, ctx: InvocationContext) -> Result<String>;
}

/// Read a non-empty string field from the payload.
fn text_field<'a>(payload: &'a serde_json::Value, key: &str) -> Result<Option<&'a str>> {
    match payload.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(Some(s.as_str())),
        Some(serde_json::Value::String(_)) => Err(AgentHostError::InvalidInput(format!(
            "'{}' must be non-empty text",
            key
        ))),
        Some(_) => Err(AgentHostError::InvalidInput(format!(
            "'{}' must be a string",
            key
        ))),
    }
}

/// Forwards `payload.prompt` to a chat agent and returns its first text field.
pub struct ChatEntrypoint {
    agent: Agent,
}

impl ChatEntrypoint {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Entrypoint for ChatEntrypoint {
    fn name(&self) -> &str {
        "chat"
    }

    async fn invoke(&self, payload: serde_json::Value, ctx: InvocationContext) -> Result<String> {
        let prompt = text_field(&payload, "prompt")?.ok_or_else(|| {
            AgentHostError::InvalidInput("payload is missing 'prompt'".to_string())
        })?;

        let response = self.agent.run_in_session(&ctx.session_id, prompt).await?;
        Ok(response.text().to_string())
    }
}

/// Runs the crew on `payload.topic` (or `payload.prompt`) and returns the report.
pub struct CrewEntrypoint {
    crew: Crew,
    default_topic: String,
}

impl CrewEntrypoint {
    pub fn new(crew: Crew, default_topic: &str) -> Self {
        Self {
            crew,
            default_topic: default_topic.to_string(),
        }
    }
}

#[async_trait]
impl Entrypoint for CrewEntrypoint {
    fn name(&self) -> &str {
        "crew"
    }

    async fn invoke(&self, payload: serde_json::Value, _ctx: InvocationContext) -> Result<String> {
        let topic = match text_field(&payload, "topic")? {
            Some(topic) => topic,
            None => text_field(&payload, "prompt")?.unwrap_or(&self.default_topic),
        };

        let output = self.crew.kickoff(&topic_inputs(topic)).await?;
        Ok(output.raw)
    }
}

/// Build the configured entrypoint, including its model backend.
pub async fn from_settings(
    settings: &Settings,
    kind: EntrypointKind,
) -> Result<Arc<dyn Entrypoint>> {
    let prompts = Prompts::from_settings(settings)?;
    let model = model::from_settings(&settings.model).await?;

    let entrypoint: Arc<dyn Entrypoint> = match kind {
        EntrypointKind::Chat => Arc::new(ChatEntrypoint::new(chat_agent(
            settings, &prompts, model,
        )?)),
        EntrypointKind::Crew => Arc::new(CrewEntrypoint::new(
            research_crew(settings, &prompts, model)?,
            &settings.crew.topic,
        )),
    };
    Ok(entrypoint)
}
