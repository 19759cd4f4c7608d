//! Crew command: run the research crew on one topic.

use crate::cli::preflight;
use crate::cli::{truncate, ModelArgs, Output};
use crate::config::{Prompts, Settings};
use crate::crew::{research_crew, topic_inputs};
use crate::model;
use anyhow::Result;

/// Run the crew command.
pub async fn run_crew(
    topic: Option<String>,
    output: Option<String>,
    model_args: &ModelArgs,
    mut settings: Settings,
) -> Result<()> {
    model_args.apply(&mut settings);
    if let Some(path) = output {
        settings.crew.output_file = Some(path);
    }

    if let Err(e) = preflight::check(&settings.model) {
        Output::error(&format!("{}", e));
        Output::info("Run 'agenthost doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let topic = topic.unwrap_or_else(|| settings.crew.topic.clone());
    let prompts = Prompts::from_settings(&settings)?;
    let model = model::from_settings(&settings.model).await?;
    let crew = research_crew(&settings, &prompts, model)?;

    Output::info(&format!(
        "Running crew of {} on '{}' ({} tasks)",
        crew.agents().len(),
        topic,
        crew.tasks().len()
    ));

    let spinner = Output::spinner("Crew working...");
    let result = crew.kickoff(&topic_inputs(&topic)).await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Crew failed: {}", e));
            return Err(e.into());
        }
    };

    for task in &report.tasks_output {
        let preview = task.raw.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
        Output::kv(
            &task.name,
            &format!("{} - {}", task.agent_role, truncate(preview, 60)),
        );
    }

    println!("\n\n=== FINAL REPORT ===\n\n");
    println!("{}", report.raw);

    if let Some(path) = settings.crew_output_path() {
        report.write_report(&path)?;
        Output::success(&format!("Report written to {}", path.display()));
    }

    Ok(())
}
