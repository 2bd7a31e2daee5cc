//! Shared primitives for all Rust crates in appdeck.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type used across appdeck crates.
pub type AppResult<T> = Result<T, AppError>;

/// App instance identifier used as the partition key for documents and record data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppInstanceId(Uuid);

impl AppInstanceId {
    /// Creates a random app instance identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an app instance identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AppInstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AppInstanceId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for AppInstanceId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid app instance id: {error}")))
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authored document or snippet text could not be interpreted.
    #[error("parse error: {0}")]
    Parse(String),

    /// A chain of follow-up actions exceeded the configured depth bound.
    #[error("action chain aborted after {depth} nested dispatches")]
    ActionChain {
        /// Depth at which the chain was aborted.
        depth: usize,
    },

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
