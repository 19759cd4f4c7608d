//! Serve command: host the entrypoint behind the invocation runtime.

use crate::cli::preflight;
use crate::cli::{ModelArgs, Output};
use crate::config::{EntrypointKind, Settings};
use crate::runtime;

/// Run the HTTP runtime server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    entrypoint: Option<EntrypointKind>,
    model: &ModelArgs,
    mut settings: Settings,
) -> anyhow::Result<()> {
    model.apply(&mut settings);
    preflight::check(&settings.model)?;

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let kind = entrypoint.unwrap_or(settings.server.entrypoint);

    let entrypoint = runtime::from_settings(&settings, kind).await?;

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("agenthost runtime");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    Output::kv("Entrypoint", &kind.to_string());
    Output::kv("Model", &settings.model.model_id);
    Output::kv("Invoke", "POST /invocations");
    Output::kv("Health", "GET  /ping");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    runtime::serve(listener, entrypoint).await?;

    Ok(())
}
