//! Error types for WriteRight
//!
//! This module provides error handling using thiserror for structured error
//! definitions and anyhow for error propagation at the binary edge.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Main error type for WriteRight operations
#[derive(Error, Debug)]
pub enum WriteRightError {
    /// Text is empty, not text, too long, or otherwise unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The sliding request window is exhausted
    #[error("Rate limit exceeded, retry in {}ms", .0.as_millis())]
    RateLimited(Duration),

    /// Grammar API failed after all retries and the fallback is disabled
    #[error("Grammar service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Message router received an action it has no handler for
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// Persisted settings or stats could not be read or written
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for WriteRight operations
pub type Result<T> = std::result::Result<T, WriteRightError>;

/// Convert anyhow::Error to WriteRightError
impl From<anyhow::Error> for WriteRightError {
    fn from(err: anyhow::Error) -> Self {
        WriteRightError::Other(err.to_string())
    }
}

/// Serializable error classification carried across the message boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    InvalidInput,
    RateLimited,
    UpstreamUnavailable,
    UnknownAction,
    StorageFailure,
    Internal,
}

impl WriteRightError {
    /// Classify this error for a structured response
    pub fn kind(&self) -> ErrorKind {
        match self {
            WriteRightError::InvalidInput(_) => ErrorKind::InvalidInput,
            WriteRightError::RateLimited(_) => ErrorKind::RateLimited,
            WriteRightError::UpstreamUnavailable(_) | WriteRightError::Http(_) => {
                ErrorKind::UpstreamUnavailable
            }
            WriteRightError::UnknownAction(_) => ErrorKind::UnknownAction,
            WriteRightError::StorageFailure(_) => ErrorKind::StorageFailure,
            WriteRightError::Config(_)
            | WriteRightError::Io(_)
            | WriteRightError::Serialization(_)
            | WriteRightError::Other(_) => ErrorKind::Internal,
        }
    }

    /// Whether a grammar request that failed this way is worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WriteRightError::Http(_) | WriteRightError::UpstreamUnavailable(_)
        )
    }
}
