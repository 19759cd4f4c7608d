//! OpenAI and Azure OpenAI client configuration.

use crate::error::{AgentHostError, Result};
use async_openai::config::{AzureConfig, OpenAIConfig};
use async_openai::Client;
use std::time::Duration;

/// Environment variables required for Azure OpenAI.
pub const AZURE_ENV_VARS: [&str; 3] = ["AZURE_API_KEY", "AZURE_API_BASE", "AZURE_API_VERSION"];

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(AgentHostError::from)
}

/// Create an OpenAI client, reading `OPENAI_API_KEY` from the environment.
///
/// `api_base` points the client at any OpenAI-compatible endpoint.
pub fn create_client(api_base: Option<&str>, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let mut config = OpenAIConfig::default();
    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }
    Ok(Client::with_config(config).with_http_client(http_client(timeout)?))
}

/// Create an Azure OpenAI client for a deployment.
///
/// Reads `AZURE_API_KEY`, `AZURE_API_BASE` and `AZURE_API_VERSION`.
pub fn create_azure_client(deployment: &str, timeout: Duration) -> Result<Client<AzureConfig>> {
    let key = required_env("AZURE_API_KEY")?;
    let base = required_env("AZURE_API_BASE")?;
    let version = required_env("AZURE_API_VERSION")?;

    let config = AzureConfig::new()
        .with_api_base(base)
        .with_api_key(key)
        .with_api_version(version)
        .with_deployment_id(deployment);

    Ok(Client::with_config(config).with_http_client(http_client(timeout)?))
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AgentHostError::Config(format!("{} is not set", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_is_config_error() {
        let err = required_env("AGENTHOST_TEST_SURELY_UNSET_AZURE_VAR").unwrap_err();
        assert!(matches!(err, AgentHostError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: AGENTHOST_TEST_SURELY_UNSET_AZURE_VAR is not set"
        );
    }

    #[test]
    fn test_blank_variable_is_config_error() {
        std::env::set_var("AGENTHOST_TEST_BLANK_AZURE_VAR", "   ");
        let result = required_env("AGENTHOST_TEST_BLANK_AZURE_VAR");
        std::env::remove_var("AGENTHOST_TEST_BLANK_AZURE_VAR");
        assert!(matches!(result, Err(AgentHostError::Config(_))));
    }
}
