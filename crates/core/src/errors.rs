//! Core error types for the AccountDesk engine.
//!
//! This module defines transport-agnostic error types. Transport errors
//! (HTTP failures, timeouts, etc.) are converted to [`Error::Unavailable`]
//! by the remote implementation.

use std::time::Duration;
use thiserror::Error;

use crate::accounts::DependentCounts;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the account engine.
///
/// Domain failures are never retried by the engine. `Unavailable` is
/// surfaced as-is and the calling layer decides whether to retry.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation not permitted in current state: {0}")]
    InvalidState(String),

    #[error("Account has related records ({} tickets, {} devices); deactivate instead", counts.tickets, counts.devices)]
    Ineligible { counts: DependentCounts },

    #[error("Confirmation arrived too early; wait {}ms", remaining.as_millis())]
    TooEarly { remaining: Duration },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Remote service unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// Returns true when re-issuing the same request may succeed.
    ///
    /// Only transport failures qualify; domain errors need different input
    /// or a different lifecycle state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Unavailable(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Validation errors for caller-supplied input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Unexpected(err.to_string())
    }
}
