//! CLI module for agenthost.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{truncate, Output};

use crate::config::{EntrypointKind, Provider, Settings};
use clap::{Args, Parser, Subcommand};

/// agenthost - host tool-using LLM agents
///
/// Runs a chat agent or a research crew once from the command line, or
/// serves it behind an invocation runtime (`POST /invocations`, `GET /ping`).
#[derive(Parser, Debug)]
#[command(name = "agenthost")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Model selection overrides shared by commands that call a model.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Model id, optionally prefixed with a provider (e.g. "azure/gpt-4.1-mini")
    #[arg(short, long, env = "AGENTHOST_MODEL")]
    pub model: Option<String>,

    /// Model provider (bedrock, azure, openai)
    #[arg(long, env = "AGENTHOST_PROVIDER")]
    pub provider: Option<Provider>,
}

impl ModelArgs {
    /// Apply the overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(provider) = self.provider {
            settings.model.provider = provider;
        }
        if let Some(model) = &self.model {
            settings.model.model_id = model.clone();
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Invoke the entrypoint once with a JSON payload, e.g. '{"prompt": "What is 2+2?"}'
    Invoke {
        /// JSON payload passed to the entrypoint
        payload: String,

        /// Entrypoint to invoke (chat, crew)
        #[arg(short, long)]
        entrypoint: Option<EntrypointKind>,

        /// Session id for conversation history
        #[arg(short, long)]
        session: Option<String>,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Serve the entrypoint over HTTP
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Entrypoint to serve (chat, crew)
        #[arg(short, long)]
        entrypoint: Option<EntrypointKind>,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Run the research crew once and print the final report
    Crew {
        /// Topic to research
        #[arg(short, long)]
        topic: Option<String>,

        /// Also write the report to this file
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// List the tools attached to the chat agent
    Tools,

    /// Check credentials and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
