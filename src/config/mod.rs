//! Configuration module

pub mod agent_config;
pub mod cli;

pub use agent_config::{load_plugin_file, parse_plugin_json, AgentConfig, CollectorConfig};
pub use cli::{CliArgs, ServerVersionArg};
