//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// Every variant is fatal to a pipeline run; nothing here is retried.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure or non-success HTTP status while fetching
    #[error("Retrieval error: {message}")]
    Retrieval {
        status: Option<u16>,
        message: String,
    },

    /// A raw record is missing an expected field or has the wrong type
    #[error("Malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// Any storage-layer failure during load
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a retrieval error, optionally carrying the HTTP status
    pub fn retrieval(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Retrieval {
            status,
            message: msg.into(),
        }
    }

    /// Create a malformed record error for the record at `index`
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            index,
            reason: reason.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// HTTP status carried by a retrieval error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Retrieval { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
