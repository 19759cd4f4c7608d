//! agenthost - host tool-using LLM agents behind an invocation runtime
//!
//! # Overview
//!
//! agenthost builds an agent, attaches a few tools, points it at a hosted
//! model and exposes a single entrypoint: a JSON payload goes in
//! (`{"prompt": "..."}`), the model's text reply comes out.
//!
//! - A chat agent with a calculator, a weather stub and optional web search
//! - A sequential research crew (researcher, then analyst) that writes a report
//! - Model backends for Amazon Bedrock (Converse), Azure OpenAI and OpenAI
//! - An HTTP runtime serving `POST /invocations` and `GET /ping`
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `model` - Provider-neutral chat model trait and backends
//! - `tools` - Calculator, weather and web search implementations
//! - `agent` - Tool dispatch, conversation window and the agent loop
//! - `crew` - Multi-agent sequential process
//! - `runtime` - Entrypoints and the HTTP invocation server
//!
//! # Example
//!
//! ```rust,no_run
//! use agenthost::config::{EntrypointKind, Settings};
//! use agenthost::runtime::{self, InvocationContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let entrypoint = runtime::from_settings(&settings, EntrypointKind::Chat).await?;
//!
//!     let reply = entrypoint
//!         .invoke(
//!             serde_json::json!({"prompt": "What is 12 * 12?"}),
//!             InvocationContext::default(),
//!         )
//!         .await?;
//!     println!("{}", reply);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod crew;
pub mod error;
pub mod model;
pub mod openai;
pub mod runtime;
pub mod tools;

pub use error::{AgentHostError, Result};
