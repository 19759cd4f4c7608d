//! Error types for agenthost.

use thiserror::Error;

/// Library-level error type for agenthost operations.
#[derive(Error, Debug)]
pub enum AgentHostError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Crew error: {0}")]
    Crew(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AgentHostError {
    /// Whether the error was caused by the caller's payload rather than the host.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, AgentHostError::InvalidInput(_))
    }
}

/// Result type alias for agenthost operations.
pub type Result<T> = std::result::Result<T, AgentHostError>;
