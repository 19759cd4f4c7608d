//! Prompt templates for agenthost.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    pub crew: CrewPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for the chat agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub system: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: "You're a helpful assistant. You can do simple math calculation, and tell the weather."
                .to_string(),
        }
    }
}

/// A crew member's persona.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RolePrompt {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    /// Tools available to this member (calculator, weather, web_search).
    #[serde(default)]
    pub tools: Vec<String>,
}

/// A unit of crew work assigned to one member by role key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskPrompt {
    pub name: String,
    pub description: String,
    pub expected_output: String,
    /// Key of the member in `CrewPrompts::agents` that performs the task.
    pub agent: String,
}

/// Members and tasks for the research crew.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewPrompts {
    /// Crew members keyed by a short name ("researcher", "analyst").
    pub agents: std::collections::BTreeMap<String, RolePrompt>,
    /// Tasks in execution order.
    pub tasks: Vec<TaskPrompt>,
}

impl Default for CrewPrompts {
    fn default() -> Self {
        let mut agents = std::collections::BTreeMap::new();
        agents.insert(
            "researcher".to_string(),
            RolePrompt {
                role: "{{topic}} Senior Research Specialist".to_string(),
                goal: "Uncover cutting-edge developments and verifiable facts about {{topic}}"
                    .to_string(),
                backstory: r#"You're a seasoned researcher with a knack for uncovering the latest developments in {{topic}}.
You search the web methodically, cross-check what you find, and never report a claim you could not source.
You're known for presenting information clearly and concisely."#
                    .to_string(),
                tools: vec!["web_search".to_string()],
            },
        );
        agents.insert(
            "analyst".to_string(),
            RolePrompt {
                role: "{{topic}} Data Analyst and Report Writer".to_string(),
                goal: "Turn research findings about {{topic}} into a comprehensive, well-structured report"
                    .to_string(),
                backstory: r#"You're a meticulous analyst with a talent for spotting patterns and implications.
You take raw research and turn it into reports that decision makers can act on.
You write in clear markdown with headings, bullet points, and a short executive summary."#
                    .to_string(),
                tools: Vec::new(),
            },
        );

        Self {
            agents,
            tasks: vec![
                TaskPrompt {
                    name: "research_task".to_string(),
                    description: r#"Conduct thorough research about {{topic}}.
Find the most relevant and recent information, including key developments, notable organisations, open problems, and statistics where available.
Use the search tool to gather facts, and keep track of where each fact came from."#
                        .to_string(),
                    expected_output: "A list of 10 bullet points with the most relevant findings about {{topic}}, each with its source."
                        .to_string(),
                    agent: "researcher".to_string(),
                },
                TaskPrompt {
                    name: "analysis_task".to_string(),
                    description: r#"Review the research findings about {{topic}} and expand each one into a full section of a report.
Identify trends, risks, and opportunities, and close with recommendations."#
                        .to_string(),
                    expected_output: "A fully fledged report in markdown (without code fences) with an executive summary, one section per finding, and a conclusion."
                        .to_string(),
                    agent: "analyst".to_string(),
                },
            ],
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }

            let crew_path = custom_path.join("crew.toml");
            if crew_path.exists() {
                let content = std::fs::read_to_string(&crew_path)?;
                prompts.crew = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Load prompts as configured in settings.
    pub fn from_settings(settings: &crate::config::Settings) -> crate::error::Result<Self> {
        Self::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
