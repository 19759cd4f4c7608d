//! Agent system for task execution with tool calling.
//!
//! Provides an LLM agent that keeps per-session conversation history and can
//! call the built-in tools (calculator, weather, web search) while answering.

mod conversation;
mod runner;
mod tools;

pub use conversation::{Conversation, DEFAULT_WINDOW_SIZE};
pub use runner::{Agent, AgentResponse, ToolCallRecord, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION};
pub use tools::{parse_tool_call, tool_definitions, ToolCall, ToolContext, ToolKind};

use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::model::ChatModel;
use crate::tools::DuckDuckGoSearch;
use std::sync::Arc;

/// Build a tool context for the given tools, wiring up web search when needed.
pub fn tool_context(settings: &Settings, kinds: Vec<ToolKind>) -> Result<ToolContext> {
    let context = ToolContext::new(kinds.clone());
    if kinds.contains(&ToolKind::WebSearch) {
        let backend = DuckDuckGoSearch::new(&settings.search)?;
        return Ok(context.with_search(Arc::new(backend), settings.search.max_results));
    }
    Ok(context)
}

/// Build the configured chat agent on top of a model.
pub fn chat_agent(
    settings: &Settings,
    prompts: &Prompts,
    model: Arc<dyn ChatModel>,
) -> Result<Agent> {
    let kinds = ToolKind::parse_list(&settings.agent.tools)?;
    let tools = tool_context(settings, kinds)?;
    let system_prompt = prompts.render_with_custom(&prompts.agent.system, &Default::default());

    Ok(Agent::new(model, tools)
        .with_system_prompt(&system_prompt)
        .with_max_iterations(settings.agent.max_iterations)
        .with_window_size(settings.agent.window_size)
        .with_max_sessions(settings.agent.max_sessions))
}
