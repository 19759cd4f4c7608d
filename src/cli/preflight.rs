//! Pre-flight checks before model calls.
//!
//! Validates that the selected provider's credentials are present before
//! starting work that would otherwise fail on the first request.

use crate::config::{ModelSettings, Provider};
use crate::error::{AgentHostError, Result};
use crate::openai::AZURE_ENV_VARS;

/// Run pre-flight checks for the configured model.
///
/// Bedrock credentials come from the AWS provider chain (environment,
/// profiles, container or instance roles) and are resolved lazily by the SDK.
pub fn check(model: &ModelSettings) -> Result<()> {
    let (provider, _) = model.resolve();
    match provider {
        Provider::Bedrock => Ok(()),
        Provider::Azure => {
            for var in AZURE_ENV_VARS {
                check_env(var, "export {}='...'")?;
            }
            Ok(())
        }
        Provider::OpenAi => {
            if model.api_base.is_some() {
                // Self-hosted compatible servers often run without a key.
                return Ok(());
            }
            check_env("OPENAI_API_KEY", "export {}='sk-...'")
        }
    }
}

/// Check that an environment variable is set and non-empty.
fn check_env(name: &str, hint: &str) -> Result<()> {
    let hint = hint.replace("{}", name);
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(()),
        Ok(_) => Err(AgentHostError::Config(format!(
            "{} is empty. Set it with: {}",
            name, hint
        ))),
        Err(_) => Err(AgentHostError::Config(format!(
            "{} not set. Set it with: {}",
            name, hint
        ))),
    }
}

/// Whether an environment variable is set and non-empty.
pub fn env_present(name: &str) -> bool {
    std::env::var(name).map(|v| !v.trim().is_empty()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bedrock_has_no_env_requirements() {
        assert!(check(&ModelSettings::default()).is_ok());
    }

    #[test]
    fn test_openai_with_custom_base_skips_key() {
        let settings = ModelSettings {
            provider: Provider::OpenAi,
            model_id: "llama3".to_string(),
            api_base: Some("http://localhost:11434/v1".to_string()),
            ..ModelSettings::default()
        };
        assert!(check(&settings).is_ok());
    }

    #[test]
    fn test_missing_variable_message() {
        let err = check_env("AGENTHOST_TEST_SURELY_UNSET_VAR", "export {}=1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: AGENTHOST_TEST_SURELY_UNSET_VAR not set. Set it with: export AGENTHOST_TEST_SURELY_UNSET_VAR=1"
        );
    }
}
