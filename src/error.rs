//! Error types for client, search, bulk, and index operations.

use thiserror::Error;

use crate::models::BulkItemFailure;

/// Errors returned by every operation in this crate.
#[derive(Error, Debug)]
pub enum EsError {
    /// The client could not be built from its settings.
    #[error("Create elasticsearch client failed: {0}")]
    Construction(String),

    /// Connection settings could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller passed an argument the operation cannot use.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The query could not be serialized to JSON.
    #[error("Error encoding query: {0}")]
    Encoding(#[source] serde_json::Error),

    /// The request could not be completed (network, DNS, connection refused).
    #[error("Error getting response: {0}")]
    Transport(#[from] elasticsearch::Error),

    /// The response body did not match the expected envelope.
    #[error("Error parsing the response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The engine rejected the request.
    #[error("[{status}] {error_type}: {reason}")]
    Engine {
        status: u16,
        error_type: String,
        reason: String,
    },

    /// The bulk request went through but some documents were rejected.
    #[error("{} documents indexed failed", failures.len())]
    PartialFailure {
        indexed: usize,
        failures: Vec<BulkItemFailure>,
    },

    /// Reading the bulk payload failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EsError {
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// The engine's `error.reason`, if this is an engine error.
    pub fn engine_reason(&self) -> Option<&str> {
        match self {
            Self::Engine { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// The engine's `error.type`, if this is an engine error.
    pub fn engine_error_type(&self) -> Option<&str> {
        match self {
            Self::Engine { error_type, .. } => Some(error_type),
            _ => None,
        }
    }

    pub fn is_index_not_found(&self) -> bool {
        self.engine_error_type() == Some("index_not_found_exception")
    }
}

pub type Result<T, E = EsError> = std::result::Result<T, E>;
