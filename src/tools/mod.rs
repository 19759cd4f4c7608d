//! Built-in tool implementations.
//!
//! The agent layer decides which of these a model may call; this module only
//! holds the behaviour behind each tool.

pub mod calculator;
pub mod search;

pub use calculator::calculate;
pub use search::{search_text, DuckDuckGoSearch, SearchBackend, SearchHit};

/// Weather lookup stub. Always reports the same conditions.
pub fn weather() -> &'static str {
    "sunny"
}
