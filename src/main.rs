//! agenthost CLI entry point.

use agenthost::cli::{commands, Cli, Commands};
use agenthost::config::Settings;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| format!("agenthost={},tower_http={}", log_level, log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    // Execute command
    match cli.command {
        Commands::Invoke {
            payload,
            entrypoint,
            session,
            model,
        } => {
            commands::run_invoke(&payload, entrypoint, session, &model, settings).await?;
        }

        Commands::Serve {
            host,
            port,
            entrypoint,
            model,
        } => {
            commands::run_serve(host, port, entrypoint, &model, settings).await?;
        }

        Commands::Crew {
            topic,
            output,
            model,
        } => {
            commands::run_crew(topic, output, &model, settings).await?;
        }

        Commands::Tools => {
            commands::run_tools(&settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings)?;
        }
    }

    Ok(())
}
