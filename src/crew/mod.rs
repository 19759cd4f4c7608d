//! Multi-agent crews.
//!
//! A crew is a fixed roster of role-playing agents and an ordered list of
//! tasks. The default research crew pairs a researcher (with web search)
//! and an analyst who turns the findings into a report.

mod process;

pub use process::{Crew, CrewAgent, CrewOutput, CrewTask, Process, TaskOutput};

use crate::agent::{tool_context, ToolKind};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::model::ChatModel;
use std::collections::HashMap;
use std::sync::Arc;

/// Build the research crew from prompt templates.
pub fn research_crew(
    settings: &Settings,
    prompts: &Prompts,
    model: Arc<dyn ChatModel>,
) -> Result<Crew> {
    let mut all_tools = Vec::new();
    let mut members = Vec::new();
    for (key, persona) in &prompts.crew.agents {
        let tools = ToolKind::parse_list(&persona.tools)?;
        for kind in &tools {
            if !all_tools.contains(kind) {
                all_tools.push(*kind);
            }
        }
        members.push(CrewAgent {
            key: key.clone(),
            role: persona.role.clone(),
            goal: persona.goal.clone(),
            backstory: persona.backstory.clone(),
            tools,
        });
    }

    let mut crew = Crew::new(model, tool_context(settings, all_tools)?)
        .with_process(Process::Sequential)
        .with_max_iterations(settings.crew.max_iterations)
        .with_variables(prompts.variables.clone());

    for member in members {
        crew = crew.agent(member);
    }
    for task in &prompts.crew.tasks {
        crew = crew.task(CrewTask {
            name: task.name.clone(),
            description: task.description.clone(),
            expected_output: task.expected_output.clone(),
            agent: task.agent.clone(),
        });
    }

    crew.validate()?;
    Ok(crew)
}

/// Kickoff inputs for a topic.
pub fn topic_inputs(topic: &str) -> HashMap<String, String> {
    HashMap::from([("topic".to_string(), topic.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::ScriptedModel;

    #[test]
    fn test_default_research_crew() {
        let settings = Settings::default();
        let prompts = Prompts::default();
        let crew = research_crew(&settings, &prompts, Arc::new(ScriptedModel::new())).unwrap();

        let keys: Vec<_> = crew.agents().iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["analyst", "researcher"]);
        let names: Vec<_> = crew.tasks().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["research_task", "analysis_task"]);

        let researcher = crew.agents().iter().find(|a| a.key == "researcher").unwrap();
        assert_eq!(researcher.tools, vec![ToolKind::WebSearch]);
    }

    #[test]
    fn test_bad_tool_name_in_persona() {
        let settings = Settings::default();
        let mut prompts = Prompts::default();
        if let Some(persona) = prompts.crew.agents.get_mut("analyst") {
            persona.tools = vec!["crystal_ball".to_string()];
        }
        assert!(research_crew(&settings, &prompts, Arc::new(ScriptedModel::new())).is_err());
    }

    #[tokio::test]
    async fn test_research_crew_kickoff_returns_analyst_report() {
        let settings = Settings::default();
        let prompts = Prompts::default();
        let model = Arc::new(
            ScriptedModel::new()
                .reply("- finding")
                .reply("# AI in Healthcare report"),
        );
        let crew = research_crew(&settings, &prompts, model.clone()).unwrap();

        let output = crew
            .kickoff(&topic_inputs(&settings.crew.topic))
            .await
            .unwrap();

        assert_eq!(output.raw, "# AI in Healthcare report");
        let calls = model.calls();
        assert_eq!(calls[0].tools, vec!["web_search"]);
        assert!(calls[0]
            .system
            .contains("Artificial Intelligence in Healthcare Senior Research Specialist"));
    }
}
