//! Protocol error types

use super::transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to the monitor
///
/// None of these are retried; the first one ends the run.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// No line arrived within the bound
    #[error("No response within {0:?}")]
    Timeout(Duration),

    /// Response does not match what the command expects
    #[error("Expected '{expected}', got '{actual}'")]
    ProtocolMismatch {
        /// Expected response text
        expected: String,
        /// Received response text
        actual: String,
    },

    /// Underlying transport failure
    #[error("Link error: {0}")]
    Link(#[from] TransportError),

    /// The line reader terminated and no more lines will arrive
    #[error("Link closed: {0}")]
    LinkClosed(String),

    /// Contradictory or invalid parameters from the caller
    #[error("Usage error: {0}")]
    Usage(String),
}

impl MonitorError {
    pub(crate) fn mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ProtocolMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        Self::Link(TransportError::IoError(err))
    }
}

/// Result alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;
