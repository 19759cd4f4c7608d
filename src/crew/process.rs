//! Sequential multi-agent crew execution.

use crate::agent::{Agent, ToolContext, ToolKind};
use crate::config::Prompts;
use crate::error::{AgentHostError, Result};
use crate::model::ChatModel;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// A crew member with a persona and a tool set.
#[derive(Debug, Clone, PartialEq)]
pub struct CrewAgent {
    /// Key tasks use to refer to this member.
    pub key: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub tools: Vec<ToolKind>,
}

impl CrewAgent {
    fn system_prompt(&self, vars: &HashMap<String, String>) -> String {
        format!(
            "You are {}.\n{}\n\nYour personal goal is: {}",
            Prompts::render(&self.role, vars),
            Prompts::render(&self.backstory, vars),
            Prompts::render(&self.goal, vars),
        )
    }
}

/// A unit of work assigned to one crew member.
#[derive(Debug, Clone, PartialEq)]
pub struct CrewTask {
    pub name: String,
    pub description: String,
    pub expected_output: String,
    /// Key of the member that performs this task.
    pub agent: String,
}

/// How tasks are scheduled across members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Process {
    /// Tasks run one after another; each sees all earlier outputs.
    #[default]
    Sequential,
}

/// Output of a single task.
#[derive(Debug, Clone)]
pub struct TaskOutput {
    pub name: String,
    pub agent_role: String,
    pub raw: String,
}

/// Output of a crew run.
#[derive(Debug, Clone)]
pub struct CrewOutput {
    /// Output of the final task.
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
}

impl CrewOutput {
    /// Write the final report, creating parent directories as needed.
    pub fn write_report(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &self.raw)?;
        Ok(())
    }
}

/// A group of agents working through tasks.
pub struct Crew {
    model: Arc<dyn ChatModel>,
    tools: ToolContext,
    agents: Vec<CrewAgent>,
    tasks: Vec<CrewTask>,
    process: Process,
    max_iterations: usize,
    variables: HashMap<String, String>,
}

impl Crew {
    /// Create an empty crew. `tools` supplies the backends members draw on.
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolContext) -> Self {
        Self {
            model,
            tools,
            agents: Vec::new(),
            tasks: Vec::new(),
            process: Process::Sequential,
            max_iterations: 15,
            variables: HashMap::new(),
        }
    }

    pub fn agent(mut self, agent: CrewAgent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn task(mut self, task: CrewTask) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn with_process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Variables available to every template, overridden by kickoff inputs.
    pub fn with_variables(mut self, variables: HashMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn agents(&self) -> &[CrewAgent] {
        &self.agents
    }

    pub fn tasks(&self) -> &[CrewTask] {
        &self.tasks
    }

    /// Check that the crew can run.
    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            return Err(AgentHostError::Crew("crew has no tasks".to_string()));
        }
        for task in &self.tasks {
            if self.member(&task.agent).is_none() {
                return Err(AgentHostError::Config(format!(
                    "task '{}' references unknown agent '{}'",
                    task.name, task.agent
                )));
            }
        }
        Ok(())
    }

    fn member(&self, key: &str) -> Option<&CrewAgent> {
        self.agents.iter().find(|a| a.key == key)
    }

    /// Run every task and return the final report.
    #[instrument(skip(self, inputs))]
    pub async fn kickoff(&self, inputs: &HashMap<String, String>) -> Result<CrewOutput> {
        self.validate()?;

        let mut vars = self.variables.clone();
        vars.extend(inputs.iter().map(|(k, v)| (k.clone(), v.clone())));

        match self.process {
            Process::Sequential => self.run_sequential(&vars).await,
        }
    }

    async fn run_sequential(&self, vars: &HashMap<String, String>) -> Result<CrewOutput> {
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        for (index, task) in self.tasks.iter().enumerate() {
            let member = self
                .member(&task.agent)
                .ok_or_else(|| AgentHostError::Config(format!("unknown agent '{}'", task.agent)))?;
            let role = Prompts::render(&member.role, vars);

            info!(
                "Task {}/{} '{}' assigned to {}",
                index + 1,
                self.tasks.len(),
                task.name,
                role
            );

            let agent = Agent::new(
                self.model.clone(),
                self.tools.restricted_to(member.tools.clone()),
            )
            .with_system_prompt(&member.system_prompt(vars))
            .with_max_iterations(self.max_iterations);

            let prompt = task_prompt(task, vars, &outputs);
            let response = agent.run(&prompt).await.map_err(|e| {
                AgentHostError::Crew(format!("task '{}' failed: {}", task.name, e))
            })?;

            info!(
                "Task '{}' finished after {} iteration(s), {} tool call(s)",
                task.name,
                response.iterations,
                response.tool_calls.len()
            );

            outputs.push(TaskOutput {
                name: task.name.clone(),
                agent_role: role,
                raw: response.text().to_string(),
            });
        }

        let raw = outputs.last().map(|o| o.raw.clone()).unwrap_or_default();
        Ok(CrewOutput {
            raw,
            tasks_output: outputs,
        })
    }
}

/// Build the prompt for a task, including earlier outputs as context.
fn task_prompt(task: &CrewTask, vars: &HashMap<String, String>, previous: &[TaskOutput]) -> String {
    let mut prompt = format!(
        "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
         You MUST return the actual complete content as the final answer, not a summary.",
        Prompts::render(&task.description, vars),
        Prompts::render(&task.expected_output, vars),
    );

    if !previous.is_empty() {
        let context = previous
            .iter()
            .map(|o| o.raw.as_str())
            .collect::<Vec<_>>()
            .join("\n\n----------\n\n");
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(&context);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::ScriptedModel;

    fn member(key: &str, tools: Vec<ToolKind>) -> CrewAgent {
        CrewAgent {
            key: key.to_string(),
            role: format!("{{{{topic}}}} {}", key),
            goal: "Do {{topic}} work".to_string(),
            backstory: "Experienced.".to_string(),
            tools,
        }
    }

    fn task(name: &str, agent: &str) -> CrewTask {
        CrewTask {
            name: name.to_string(),
            description: format!("{} about {{{{topic}}}}", name),
            expected_output: "Bullet points".to_string(),
            agent: agent.to_string(),
        }
    }

    fn inputs(topic: &str) -> HashMap<String, String> {
        HashMap::from([("topic".to_string(), topic.to_string())])
    }

    #[tokio::test]
    async fn test_sequential_passes_context() {
        let model = Arc::new(
            ScriptedModel::new()
                .reply("finding one; finding two")
                .reply("# Report"),
        );
        let crew = Crew::new(model.clone(), ToolContext::empty())
            .agent(member("researcher", vec![ToolKind::Calculator]))
            .agent(member("analyst", Vec::new()))
            .task(task("research", "researcher"))
            .task(task("analysis", "analyst"));

        let output = crew.kickoff(&inputs("Robotics")).await.unwrap();

        assert_eq!(output.raw, "# Report");
        assert_eq!(output.tasks_output.len(), 2);
        assert_eq!(output.tasks_output[0].agent_role, "Robotics researcher");

        let calls = model.calls();
        assert!(calls[0].system.starts_with("You are Robotics researcher."));
        assert_eq!(calls[0].tools, vec!["calculator"]);
        assert!(calls[1].tools.is_empty());

        let first_prompt = calls[0].messages[0].first_text().unwrap();
        assert!(first_prompt.contains("research about Robotics"));
        assert!(!first_prompt.contains("context you're working with"));

        let second_prompt = calls[1].messages[0].first_text().unwrap();
        assert!(second_prompt.contains("analysis about Robotics"));
        assert!(second_prompt.contains("finding one; finding two"));
        // Each task starts from a fresh conversation.
        assert_eq!(calls[1].messages.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_agent_is_config_error() {
        let model = Arc::new(ScriptedModel::new());
        let crew = Crew::new(model, ToolContext::empty())
            .agent(member("researcher", Vec::new()))
            .task(task("analysis", "analyst"));

        let result = crew.kickoff(&inputs("x")).await;
        assert!(matches!(result, Err(AgentHostError::Config(_))));
    }

    #[tokio::test]
    async fn test_empty_crew_fails() {
        let model = Arc::new(ScriptedModel::new());
        let crew = Crew::new(model, ToolContext::empty());
        assert!(matches!(
            crew.kickoff(&HashMap::new()).await,
            Err(AgentHostError::Crew(_))
        ));
    }

    #[tokio::test]
    async fn test_task_failure_names_task() {
        let model = Arc::new(ScriptedModel::new().reply("ok").fail("throttled"));
        let crew = Crew::new(model, ToolContext::empty())
            .agent(member("a", Vec::new()))
            .task(task("first", "a"))
            .task(task("second", "a"));

        let err = crew.kickoff(&inputs("x")).await.unwrap_err();
        assert!(err.to_string().contains("task 'second' failed"));
    }

    #[tokio::test]
    async fn test_inputs_override_variables() {
        let model = Arc::new(ScriptedModel::new().reply("done"));
        let crew = Crew::new(model.clone(), ToolContext::empty())
            .with_variables(inputs("Default Topic"))
            .agent(member("a", Vec::new()))
            .task(task("only", "a"));

        crew.kickoff(&inputs("Chosen Topic")).await.unwrap();
        let prompt = model.calls()[0].messages[0].first_text().unwrap().to_string();
        assert!(prompt.contains("Chosen Topic"));
    }

    #[test]
    fn test_write_report_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("report.md");
        let output = CrewOutput {
            raw: "# Final".to_string(),
            tasks_output: Vec::new(),
        };

        output.write_report(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Final");
    }
}
