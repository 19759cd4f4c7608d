//! Agent runner with tool calling loop.

use super::conversation::{Conversation, DEFAULT_WINDOW_SIZE};
use super::tools::{parse_tool_call, ToolContext};
use crate::error::{AgentHostError, Result};
use crate::model::{ChatModel, ContentBlock, Message, Role, StopReason};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Session used by [`Agent::run`].
pub const DEFAULT_SESSION: &str = "default";

/// Sessions retained before the least recently used one is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Default system prompt for the agent.
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Agent that can use tools while answering a prompt.
///
/// Conversation history is kept per session, so successive prompts on the
/// same session see earlier turns.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: ToolContext,
    max_iterations: usize,
    window_size: usize,
    system_prompt: String,
    max_sessions: usize,
    sessions: Mutex<Sessions>,
}

struct SessionEntry {
    conversation: Arc<Mutex<Conversation>>,
    last_used: u64,
}

/// Session conversations with a use counter for LRU eviction.
#[derive(Default)]
struct Sessions {
    entries: HashMap<String, SessionEntry>,
    clock: u64,
}

impl Agent {
    /// Create a new agent backed by the given model and tools.
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolContext) -> Self {
        Self {
            model,
            tools,
            max_iterations: 15,
            window_size: DEFAULT_WINDOW_SIZE,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_sessions: DEFAULT_MAX_SESSIONS,
            sessions: Mutex::new(Sessions::default()),
        }
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set how many messages each session keeps.
    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Set how many sessions are retained. At least one is always kept.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max.max(1);
        self
    }

    pub fn tools(&self) -> &ToolContext {
        &self.tools
    }

    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Run the agent on the default session.
    pub async fn run(&self, prompt: &str) -> Result<AgentResponse> {
        self.run_in_session(DEFAULT_SESSION, prompt).await
    }

    /// Run the agent with a user prompt on a named session.
    #[instrument(skip(self, prompt), fields(model = %self.model.model_id()))]
    pub async fn run_in_session(&self, session_id: &str, prompt: &str) -> Result<AgentResponse> {
        if prompt.trim().is_empty() {
            return Err(AgentHostError::InvalidInput(
                "prompt must be non-empty text".to_string(),
            ));
        }

        let session = self.session(session_id).await;
        let mut conversation = session.lock().await;

        let checkpoint = conversation.len();
        conversation.push(Message::user_text(prompt));

        match self.drive(&mut conversation).await {
            Ok(response) => {
                conversation.apply_window();
                Ok(response)
            }
            Err(e) => {
                conversation.truncate(checkpoint);
                Err(e)
            }
        }
    }

    /// Messages currently held for a session.
    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        let session = self
            .sessions
            .lock()
            .await
            .entries
            .get(session_id)
            .map(|entry| entry.conversation.clone());
        match session {
            Some(conversation) => conversation.lock().await.messages().to_vec(),
            None => Vec::new(),
        }
    }

    /// Forget a session's history.
    pub async fn reset(&self, session_id: &str) {
        self.sessions.lock().await.entries.remove(session_id);
    }

    /// Number of sessions currently retained.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.entries.len()
    }

    async fn session(&self, session_id: &str) -> Arc<Mutex<Conversation>> {
        let mut sessions = self.sessions.lock().await;
        sessions.clock += 1;
        let now = sessions.clock;

        if let Some(entry) = sessions.entries.get_mut(session_id) {
            entry.last_used = now;
            return entry.conversation.clone();
        }

        if sessions.entries.len() >= self.max_sessions {
            let oldest = sessions
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                debug!("Evicting session {}", id);
                sessions.entries.remove(&id);
            }
        }

        let conversation = Arc::new(Mutex::new(Conversation::new(self.window_size)));
        sessions.entries.insert(
            session_id.to_string(),
            SessionEntry {
                conversation: conversation.clone(),
                last_used: now,
            },
        );
        conversation
    }

    async fn drive(&self, conversation: &mut Conversation) -> Result<AgentResponse> {
        let definitions = self.tools.definitions();
        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(AgentHostError::Agent(format!(
                    "Agent exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Agent iteration {}", iterations);

            let turn = self
                .model
                .converse(&self.system_prompt, conversation.messages(), &definitions)
                .await?;

            conversation.push(turn.message.clone());

            let tool_uses: Vec<(String, String, serde_json::Value)> = turn
                .message
                .tool_uses()
                .into_iter()
                .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
                .collect();

            if tool_uses.is_empty() {
                return Ok(AgentResponse {
                    message: turn.message,
                    tool_calls: tool_calls_made,
                    iterations,
                    stop_reason: turn.stop_reason,
                });
            }

            let mut results = Vec::with_capacity(tool_uses.len());
            for (id, name, input) in tool_uses {
                let record = self.execute_tool_call(&name, &input).await;
                results.push(ContentBlock::ToolResult {
                    tool_use_id: id,
                    content: record.result.clone(),
                    is_error: record.is_error,
                });
                tool_calls_made.push(record);
            }

            conversation.push(Message {
                role: Role::User,
                content: results,
            });
        }
    }

    /// Execute a single tool call and return a record of it.
    async fn execute_tool_call(&self, name: &str, input: &serde_json::Value) -> ToolCallRecord {
        info!("Agent calling tool: {} with args: {}", name, input);

        let (result, is_error) = match parse_tool_call(name, input) {
            Ok(tool) => match self.tools.execute(&tool).await {
                Ok(output) => (output, false),
                Err(e) => (format!("Tool error: {}", e), true),
            },
            Err(e) => (format!("Failed to parse tool call: {}", e), true),
        };

        ToolCallRecord {
            name: name.to_string(),
            arguments: input.to_string(),
            result,
            is_error,
        }
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final message from the model.
    pub message: Message,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
    /// Why the final model call stopped.
    pub stop_reason: StopReason,
}

impl AgentResponse {
    /// The first text block of the final message, or an empty string.
    pub fn text(&self) -> &str {
        self.message.first_text().unwrap_or_default()
    }
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
    /// Whether the result describes a failure.
    pub is_error: bool,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}
