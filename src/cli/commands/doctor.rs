//! Doctor command - verify credentials and configuration.

use crate::agent::ToolKind;
use crate::cli::preflight::env_present;
use crate::cli::Output;
use crate::config::{Prompts, Provider, Settings};
use crate::openai::AZURE_ENV_VARS;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("agenthost doctor");
    println!();

    let mut checks = Vec::new();

    println!("{}", style("Model").bold());
    let model_checks = check_model(settings);
    for check in &model_checks {
        check.print();
    }
    checks.extend(model_checks);
    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = check_configuration(settings);
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);
    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!("{} error(s), {} warning(s)", errors, warnings));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All required checks passed with {} warning(s)", warnings));
    } else {
        Output::success("All checks passed!");
    }

    Ok(())
}

fn check_model(settings: &Settings) -> Vec<CheckResult> {
    let (provider, model) = settings.model.resolve();
    let mut checks = vec![CheckResult::ok(
        "Model",
        &format!("{} via {}", model, provider),
    )];

    match provider {
        Provider::Bedrock => {
            let has_env_keys = env_present("AWS_ACCESS_KEY_ID") && env_present("AWS_SECRET_ACCESS_KEY");
            let has_profile = env_present("AWS_PROFILE");
            if has_env_keys || has_profile {
                checks.push(CheckResult::ok("AWS credentials", "found in environment"));
            } else {
                checks.push(CheckResult::warning(
                    "AWS credentials",
                    "none in environment; relying on the default provider chain",
                    "Set AWS_PROFILE or AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY when not running under an IAM role",
                ));
            }

            let region = settings.model.region.is_some()
                || env_present("AWS_REGION")
                || env_present("AWS_DEFAULT_REGION");
            if region {
                checks.push(CheckResult::ok("AWS region", "configured"));
            } else {
                checks.push(CheckResult::warning(
                    "AWS region",
                    "not set",
                    "Set [model] region in the config file or export AWS_REGION=us-west-2",
                ));
            }
        }
        Provider::Azure => {
            for var in AZURE_ENV_VARS {
                if env_present(var) {
                    checks.push(CheckResult::ok(var, "set"));
                } else {
                    checks.push(CheckResult::error(
                        var,
                        "not set",
                        &format!("export {}='...'", var),
                    ));
                }
            }
        }
        Provider::OpenAi => {
            if env_present("OPENAI_API_KEY") {
                checks.push(CheckResult::ok("OPENAI_API_KEY", "set"));
            } else if settings.model.api_base.is_some() {
                checks.push(CheckResult::warning(
                    "OPENAI_API_KEY",
                    "not set",
                    "Only needed if your compatible endpoint requires a key",
                ));
            } else {
                checks.push(CheckResult::error(
                    "OPENAI_API_KEY",
                    "not set",
                    "export OPENAI_API_KEY='sk-...'",
                ));
            }
        }
    }

    checks
}

fn check_configuration(settings: &Settings) -> Vec<CheckResult> {
    let mut checks = Vec::new();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        checks.push(CheckResult::ok(
            "Config file",
            &config_path.display().to_string(),
        ));
    } else {
        checks.push(CheckResult::warning(
            "Config file",
            "not found, using defaults",
            "Create one with: agenthost config init",
        ));
    }

    match ToolKind::parse_list(&settings.agent.tools) {
        Ok(kinds) => {
            let names: Vec<_> = kinds.iter().map(|k| k.name()).collect();
            checks.push(CheckResult::ok("Agent tools", &names.join(", ")));
        }
        Err(e) => checks.push(CheckResult::error(
            "Agent tools",
            &e.to_string(),
            "Valid tools are calculator, weather and web_search",
        )),
    }

    match Prompts::from_settings(settings) {
        Ok(prompts) => checks.push(CheckResult::ok(
            "Prompts",
            &format!(
                "{} crew member(s), {} task(s)",
                prompts.crew.agents.len(),
                prompts.crew.tasks.len()
            ),
        )),
        Err(e) => checks.push(CheckResult::error(
            "Prompts",
            &e.to_string(),
            "Fix the TOML files in prompts.custom_dir",
        )),
    }

    checks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_tool_name_is_error() {
        let mut settings = Settings::default();
        settings.agent.tools = vec!["teleporter".to_string()];
        let checks = check_configuration(&settings);
        let tools = checks.iter().find(|c| c.name == "Agent tools").unwrap();
        assert_eq!(tools.status, CheckStatus::Error);
    }

    #[test]
    fn test_model_check_reports_provider() {
        let settings = Settings::default();
        let checks = check_model(&settings);
        assert!(checks[0].message.contains("bedrock"));
    }
}
