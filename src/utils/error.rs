//! Error types for cassandra-metrics-agent

use std::io;
use thiserror::Error;

/// Top-level agent error
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Topology error: {0}")]
    Topology(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while reading one attribute from a management endpoint
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Attribute {attribute} not found under {object}")]
    AttributeNotFound { object: String, attribute: String },

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Unexpected shape for {object}/{attribute}: expected {expected}, got {actual}")]
    UnexpectedShape {
        object: String,
        attribute: String,
        expected: String,
        actual: String,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl FetchError {
    /// Whether a fallback attribute may be tried after this error.
    ///
    /// Only transport failures are fatal to a host's fetch; everything else
    /// means "this particular attribute is not usable".
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FetchError::Connection(_))
    }

    /// Whether the endpoint itself is gone, so no further request to it can succeed
    ///
    /// An HTTP error status or an unreadable body concerns one request only.
    pub fn is_host_fatal(&self) -> bool {
        matches!(
            self,
            FetchError::Connection(
                ConnectionError::ConnectFailed { .. }
                    | ConnectionError::Timeout(_)
                    | ConnectionError::AuthFailed(_)
            )
        )
    }
}

/// Transport-level errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Failed to connect to {host}:{port}: {reason}")]
    ConnectFailed {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors from the unit and size normalizers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid formatted size: {0:?}")]
    Size(String),

    #[error("Unknown time unit: {0:?}")]
    TimeUnit(String),

    #[error("Unrecognized release version: {0:?}")]
    Version(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
