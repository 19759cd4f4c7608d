//! Configuration module for agenthost.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, CrewPrompts, Prompts, RolePrompt, TaskPrompt};
pub use settings::{
    AgentSettings, CrewSettings, EntrypointKind, GeneralSettings, ModelSettings, PromptSettings,
    Provider, SearchSettings, ServerSettings, Settings,
};
