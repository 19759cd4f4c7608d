//! Tool definitions and dispatch for the agent system.

use crate::error::{AgentHostError, Result};
use crate::model::ToolSpec;
use crate::tools::{self, SearchBackend};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tools an agent can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Calculator,
    Weather,
    WebSearch,
}

impl ToolKind {
    /// Name the model uses to call the tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Calculator => "calculator",
            ToolKind::Weather => "weather",
            ToolKind::WebSearch => "web_search",
        }
    }

    /// Parse a list of configured tool names.
    pub fn parse_list(names: &[String]) -> Result<Vec<ToolKind>> {
        let mut kinds = Vec::with_capacity(names.len());
        for name in names {
            let kind = name.parse::<ToolKind>().map_err(AgentHostError::Config)?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }
}

impl std::str::FromStr for ToolKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "calculator" | "calc" => Ok(ToolKind::Calculator),
            "weather" => Ok(ToolKind::Weather),
            "web_search" | "search" => Ok(ToolKind::WebSearch),
            _ => Err(format!("Unknown tool: {}", s)),
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A parsed tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Evaluate an arithmetic expression.
    Calculator { expression: String },

    /// Get the current weather.
    Weather,

    /// Search the web.
    WebSearch { query: String },
}

impl ToolCall {
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolCall::Calculator { .. } => ToolKind::Calculator,
            ToolCall::Weather => ToolKind::Weather,
            ToolCall::WebSearch { .. } => ToolKind::WebSearch,
        }
    }
}

/// Tool execution context: which tools are enabled and what backs them.
#[derive(Clone)]
pub struct ToolContext {
    enabled: Vec<ToolKind>,
    search: Option<Arc<dyn SearchBackend>>,
    max_search_results: usize,
}

impl ToolContext {
    /// Create a context with the given tools. Web search needs a backend.
    pub fn new(enabled: Vec<ToolKind>) -> Self {
        Self {
            enabled,
            search: None,
            max_search_results: 5,
        }
    }

    /// A context with no tools.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Attach the backend used by the web search tool.
    pub fn with_search(mut self, backend: Arc<dyn SearchBackend>, max_results: usize) -> Self {
        self.search = Some(backend);
        self.max_search_results = max_results;
        self
    }

    /// A context with the same search backend but a different tool set.
    pub fn restricted_to(&self, enabled: Vec<ToolKind>) -> Self {
        Self {
            enabled,
            search: self.search.clone(),
            max_search_results: self.max_search_results,
        }
    }

    pub fn enabled(&self) -> &[ToolKind] {
        &self.enabled
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    /// Tool specs advertised to the model.
    pub fn definitions(&self) -> Vec<ToolSpec> {
        tool_definitions(&self.enabled)
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        if !self.enabled.contains(&tool.kind()) {
            return Err(AgentHostError::Tool(format!(
                "Tool '{}' is not available to this agent",
                tool.kind()
            )));
        }

        match tool {
            ToolCall::Calculator { expression } => tools::calculate(expression),
            ToolCall::Weather => Ok(tools::weather().to_string()),
            ToolCall::WebSearch { query } => {
                let backend = self.search.as_ref().ok_or_else(|| {
                    AgentHostError::Config("web_search enabled without a search backend".to_string())
                })?;
                Ok(tools::search_text(backend.as_ref(), query, self.max_search_results).await)
            }
        }
    }
}

/// Tool specs for the given tools.
pub fn tool_definitions(kinds: &[ToolKind]) -> Vec<ToolSpec> {
    kinds.iter().map(|kind| definition(*kind)).collect()
}

fn definition(kind: ToolKind) -> ToolSpec {
    match kind {
        ToolKind::Calculator => ToolSpec {
            name: kind.name().to_string(),
            description: "Evaluate an arithmetic expression. Supports + - * / % ^, parentheses, \
                sqrt, abs, ln, log, exp, sin, cos, tan, floor, ceil, round, and the constants pi and e."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "expression": {
                        "type": "string",
                        "description": "The expression to evaluate, e.g. \"(2 + 3) * 4\""
                    }
                },
                "required": ["expression"]
            }),
        },
        ToolKind::Weather => ToolSpec {
            name: kind.name().to_string(),
            description: "Get weather".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolKind::WebSearch => ToolSpec {
            name: kind.name().to_string(),
            description: "Useful for searching the web for information.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
        },
    }
}

/// Parse a tool call from the model's name and JSON arguments.
pub fn parse_tool_call(name: &str, args: &serde_json::Value) -> Result<ToolCall> {
    let kind = name
        .parse::<ToolKind>()
        .map_err(AgentHostError::Tool)?;

    if let serde_json::Value::String(raw) = args {
        return Err(AgentHostError::Tool(format!(
            "Invalid tool arguments: {}",
            raw
        )));
    }

    let string_arg = |key: &str| -> Result<String> {
        args.get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| AgentHostError::Tool(format!("Missing '{}' argument", key)))
    };

    match kind {
        ToolKind::Calculator => Ok(ToolCall::Calculator {
            expression: string_arg("expression")?,
        }),
        ToolKind::Weather => Ok(ToolCall::Weather),
        ToolKind::WebSearch => Ok(ToolCall::WebSearch {
            query: string_arg("query")?,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::SearchHit;
    use async_trait::async_trait;

    struct FailingSearch;

    #[async_trait]
    impl SearchBackend for FailingSearch {
        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
            Err(AgentHostError::Search("rate limited".to_string()))
        }
    }

    struct FixedSearch;

    #[async_trait]
    impl SearchBackend for FixedSearch {
        async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
            Ok((0..max_results)
                .map(|i| SearchHit {
                    title: format!("{} #{}", query, i),
                    url: format!("https://example.com/{}", i),
                    snippet: "snippet".to_string(),
                })
                .collect())
        }
    }

    #[test]
    fn test_parse_calculator_tool() {
        let tool = parse_tool_call("calculator", &serde_json::json!({"expression": "2+2"})).unwrap();
        assert_eq!(
            tool,
            ToolCall::Calculator {
                expression: "2+2".to_string()
            }
        );
    }

    #[test]
    fn test_parse_weather_ignores_arguments() {
        let tool = parse_tool_call("weather", &serde_json::json!({"city": "Oslo"})).unwrap();
        assert_eq!(tool, ToolCall::Weather);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_tool_call("web_search", &serde_json::json!({})).is_err());
        assert!(parse_tool_call("teleport", &serde_json::json!({})).is_err());
        assert!(parse_tool_call("calculator", &serde_json::json!("{broken")).is_err());
    }

    #[test]
    fn test_parse_list_dedupes_and_rejects_unknown() {
        let names = vec![
            "calculator".to_string(),
            "Weather".to_string(),
            "calc".to_string(),
        ];
        assert_eq!(
            ToolKind::parse_list(&names).unwrap(),
            vec![ToolKind::Calculator, ToolKind::Weather]
        );
        assert!(ToolKind::parse_list(&["laser".to_string()]).is_err());
    }

    #[test]
    fn test_definitions_follow_enabled_order() {
        let context = ToolContext::new(vec![ToolKind::Weather, ToolKind::Calculator]);
        let names: Vec<_> = context.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["weather", "calculator"]);
    }

    #[tokio::test]
    async fn test_execute_weather_and_calculator() {
        let context = ToolContext::new(vec![ToolKind::Calculator, ToolKind::Weather]);
        assert_eq!(context.execute(&ToolCall::Weather).await.unwrap(), "sunny");
        let result = context
            .execute(&ToolCall::Calculator {
                expression: "6 * 7".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(result, "42");
    }

    #[tokio::test]
    async fn test_execute_disabled_tool_fails() {
        let context = ToolContext::new(vec![ToolKind::Weather]);
        let result = context
            .execute(&ToolCall::Calculator {
                expression: "1".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AgentHostError::Tool(_))));
    }

    #[tokio::test]
    async fn test_search_failure_returns_error_text() {
        let context = ToolContext::new(vec![ToolKind::WebSearch])
            .with_search(Arc::new(FailingSearch), 5);
        let result = context
            .execute(&ToolCall::WebSearch {
                query: "ai".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(result, "Error performing search: Search error: rate limited");
    }

    #[tokio::test]
    async fn test_search_respects_max_results() {
        let context =
            ToolContext::new(vec![ToolKind::WebSearch]).with_search(Arc::new(FixedSearch), 2);
        let result = context
            .execute(&ToolCall::WebSearch {
                query: "ai".to_string(),
            })
            .await
            .unwrap();
        assert!(result.contains("ai #1"));
        assert!(!result.contains("ai #2"));
    }

    #[test]
    fn test_restricted_to_keeps_backend() {
        let context = ToolContext::new(vec![ToolKind::WebSearch])
            .with_search(Arc::new(FixedSearch), 3);
        let restricted = context.restricted_to(Vec::new());
        assert!(restricted.is_empty());
        assert!(restricted.search.is_some());
        assert_eq!(restricted.max_search_results, 3);
    }
}
