//! Utility modules

pub mod error;

pub use error::{AgentError, ConnectionError, FetchError, ParseError, Result};
