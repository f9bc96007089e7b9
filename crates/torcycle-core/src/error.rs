//! Error types for torcycle
//!
//! This module defines all error types used throughout the crate.

use crate::lifecycle::TerminationReason;
use thiserror::Error;

/// Result type alias for torcycle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for torcycle
#[derive(Error, Debug)]
pub enum Error {
    /// A lifecycle command could not be executed
    #[error("Service control error: {0}")]
    ServiceControl(String),

    /// The address lookup failed
    #[error("{0}")]
    Probe(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operator entered something that is not a non-negative integer
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Reading from or writing to the operator terminal failed
    #[error("Console error: {0}")]
    Console(#[from] std::io::Error),

    /// A termination signal arrived while the session was suspended
    #[error("Interrupted by {0}")]
    Interrupted(TerminationReason),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a service control error
    pub fn service_control(msg: impl Into<String>) -> Self {
        Self::ServiceControl(msg.into())
    }

    /// Create a probe error
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error is the cancellation path rather than a fault
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
