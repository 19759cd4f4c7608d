//! CLI command implementations.

mod config;
mod crew;
mod doctor;
mod invoke;
mod serve;
mod tools;

pub use config::run_config;
pub use crew::run_crew;
pub use doctor::run_doctor;
pub use invoke::run_invoke;
pub use serve::run_serve;
pub use tools::run_tools;
