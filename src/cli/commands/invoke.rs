//! Invoke command: run the entrypoint once on a command-line payload.

use crate::cli::preflight;
use crate::cli::{ModelArgs, Output};
use crate::config::{EntrypointKind, Settings};
use crate::runtime::{self, InvocationContext};
use anyhow::{Context, Result};

/// Run the invoke command.
pub async fn run_invoke(
    payload: &str,
    entrypoint: Option<EntrypointKind>,
    session: Option<String>,
    model: &ModelArgs,
    mut settings: Settings,
) -> Result<()> {
    model.apply(&mut settings);

    let payload: serde_json::Value =
        serde_json::from_str(payload).context("Payload must be a JSON object, e.g. '{\"prompt\": \"...\"}'")?;

    if let Err(e) = preflight::check(&settings.model) {
        Output::error(&format!("{}", e));
        Output::info("Run 'agenthost doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let kind = entrypoint.unwrap_or(settings.server.entrypoint);
    let entrypoint = runtime::from_settings(&settings, kind).await?;

    let ctx = match session {
        Some(id) => InvocationContext::for_session(id),
        None => InvocationContext::default(),
    };

    let spinner = Output::spinner(&format!("Running {} entrypoint...", entrypoint.name()));
    let result = entrypoint.invoke(payload, ctx).await;
    spinner.finish_and_clear();

    match result {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Invocation failed: {}", e));
            Err(e.into())
        }
    }
}
