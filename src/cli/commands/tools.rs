//! Tools command: list the chat agent's tools.

use crate::agent::{tool_definitions, ToolKind};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the tools command.
pub fn run_tools(settings: &Settings) -> Result<()> {
    let kinds = ToolKind::parse_list(&settings.agent.tools)?;

    Output::header(&format!("Chat agent tools ({})", kinds.len()));
    if kinds.is_empty() {
        Output::info("No tools configured. Add some under [agent] tools in the config file.");
        return Ok(());
    }

    for def in tool_definitions(&kinds) {
        Output::tool(&def.name, &def.description);
    }
    println!();

    Ok(())
}
