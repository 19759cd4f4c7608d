//! Configuration settings for agenthost.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub agent: AgentSettings,
    pub crew: CrewSettings,
    pub search: SearchSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Hosted model provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Amazon Bedrock Converse API (default).
    #[default]
    Bedrock,
    /// Azure OpenAI deployments.
    Azure,
    /// OpenAI or any OpenAI-compatible endpoint.
    #[serde(rename = "openai")]
    OpenAi,
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bedrock" | "aws" => Ok(Provider::Bedrock),
            "azure" => Ok(Provider::Azure),
            "openai" => Ok(Provider::OpenAi),
            _ => Err(format!("Unknown model provider: {}", s)),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Bedrock => write!(f, "bedrock"),
            Provider::Azure => write!(f, "azure"),
            Provider::OpenAi => write!(f, "openai"),
        }
    }
}

/// Model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Provider used when the model id carries no `provider/` prefix.
    pub provider: Provider,
    /// Model identifier, optionally prefixed (e.g. "azure/gpt-4.1-mini").
    pub model_id: String,
    /// AWS region for Bedrock. Falls back to the default AWS chain.
    pub region: Option<String>,
    /// Override for OpenAI-compatible endpoints.
    pub api_base: Option<String>,
    /// Maximum tokens to generate per model call.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: Provider::Bedrock,
            model_id: "us.anthropic.claude-sonnet-4-20250514-v1:0".to_string(),
            region: None,
            api_base: None,
            max_tokens: None,
            temperature: None,
            timeout_secs: 300,
        }
    }
}

impl ModelSettings {
    /// Settings matching the Azure OpenAI deployment used by the hosted chat agent.
    pub fn azure_default() -> Self {
        Self {
            provider: Provider::Azure,
            model_id: "azure/gpt-4.1-mini".to_string(),
            max_tokens: Some(32000),
            temperature: Some(0.7),
            ..Self::default()
        }
    }

    /// Resolve the effective provider and the bare model name.
    ///
    /// A `provider/` prefix on the model id wins over the configured provider.
    pub fn resolve(&self) -> (Provider, String) {
        if let Some((prefix, rest)) = self.model_id.split_once('/') {
            if let Ok(provider) = prefix.parse::<Provider>() {
                return (provider, rest.to_string());
            }
        }
        (self.provider, self.model_id.clone())
    }
}

/// Chat agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Tools attached to the chat agent (calculator, weather, web_search).
    pub tools: Vec<String>,
    /// Maximum model calls per invocation.
    pub max_iterations: usize,
    /// Messages kept in a session's conversation window.
    pub window_size: usize,
    /// Sessions retained before the least recently used one is evicted.
    pub max_sessions: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            tools: vec!["calculator".to_string(), "weather".to_string()],
            max_iterations: 15,
            window_size: 40,
            max_sessions: crate::agent::DEFAULT_MAX_SESSIONS,
        }
    }
}

/// Research crew settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewSettings {
    /// Topic used when a run does not name one.
    pub topic: String,
    /// Maximum model calls per crew task.
    pub max_iterations: usize,
    /// Write the final report to this file.
    pub output_file: Option<String>,
}

impl Default for CrewSettings {
    fn default() -> Self {
        Self {
            topic: "Artificial Intelligence in Healthcare".to_string(),
            max_iterations: 15,
            output_file: None,
        }
    }
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// DuckDuckGo HTML endpoint.
    pub endpoint: String,
    /// Maximum number of hits returned to the agent.
    pub max_results: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// User agent sent with search requests.
    pub user_agent: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
            max_results: 5,
            timeout_secs: 30,
            user_agent: concat!("agenthost/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Which entrypoint the runtime serves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntrypointKind {
    /// Single chat agent with tools.
    #[default]
    Chat,
    /// Sequential research crew.
    Crew,
}

impl std::str::FromStr for EntrypointKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" | "agent" => Ok(EntrypointKind::Chat),
            "crew" => Ok(EntrypointKind::Crew),
            _ => Err(format!("Unknown entrypoint: {}", s)),
        }
    }
}

impl std::fmt::Display for EntrypointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntrypointKind::Chat => write!(f, "chat"),
            EntrypointKind::Crew => write!(f, "crew"),
        }
    }
}

/// Runtime server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub entrypoint: EntrypointKind,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            entrypoint: EntrypointKind::Chat,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AgentHostError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agenthost")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded crew report path, if one is configured.
    pub fn crew_output_path(&self) -> Option<PathBuf> {
        self.crew.output_file.as_deref().map(Self::expand_path)
    }
}
