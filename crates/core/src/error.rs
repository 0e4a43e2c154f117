//! Error types for Roster
//!
//! Every fallible operation in the workspace returns `RosterResult<T>`.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Absence is never an error: lookups return `Ok(None)`.

use crate::contract::CommitRejection;
use crate::key::KeyError;
use crate::limits::LimitError;
use std::io;
use thiserror::Error;

/// Result type alias for Roster operations
pub type RosterResult<T> = std::result::Result<T, RosterError>;

/// Error taxonomy shared by the store and the directory
#[derive(Debug, Error)]
pub enum RosterError {
    /// An atomic group's precondition failed
    ///
    /// Raised on duplicate id/login/session during creation and on concurrent
    /// modification during rotation or deletion. Carries the rejected commit
    /// so the caller can tell which keys failed.
    #[error("conflict during {operation}: {rejection}")]
    Conflict {
        /// Operation whose commit was rejected
        operation: &'static str,
        /// The failed checks reported by the store
        rejection: CommitRejection,
    },

    /// A record that must exist is missing
    #[error("integrity violation: {reason}")]
    IntegrityViolation {
        /// What was expected and not found
        reason: String,
    },

    /// Caller supplied an unusable argument
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem
        message: String,
    },

    /// Encoding or decoding of a stored payload failed
    #[error("serialization error: {message}")]
    Serialization {
        /// Underlying codec message
        message: String,
    },

    /// Storage layer failure (WAL, data directory, lock file)
    #[error("storage error: {message}")]
    Storage {
        /// Description of the failure
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Persisted data failed validation
    #[error("data corruption: {message}")]
    Corruption {
        /// Description of the corruption
        message: String,
    },

    /// The database has been shut down
    #[error("database is closed")]
    Closed,
}

impl RosterError {
    /// Build a `Conflict` error for a rejected commit
    pub fn conflict(operation: &'static str, rejection: CommitRejection) -> Self {
        RosterError::Conflict {
            operation,
            rejection,
        }
    }

    /// Build an `IntegrityViolation` error
    pub fn integrity(reason: impl Into<String>) -> Self {
        RosterError::IntegrityViolation {
            reason: reason.into(),
        }
    }

    /// Build an `InvalidInput` error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        RosterError::InvalidInput {
            message: message.into(),
        }
    }

    /// Build a `Serialization` error
    pub fn serialization(message: impl Into<String>) -> Self {
        RosterError::Serialization {
            message: message.into(),
        }
    }

    /// Build a `Storage` error
    pub fn storage(message: impl Into<String>) -> Self {
        RosterError::Storage {
            message: message.into(),
        }
    }

    /// Build a `Corruption` error
    pub fn corruption(message: impl Into<String>) -> Self {
        RosterError::Corruption {
            message: message.into(),
        }
    }

    /// Check if this error is a rejected atomic group
    pub fn is_conflict(&self) -> bool {
        matches!(self, RosterError::Conflict { .. })
    }

    /// Check if this error reports a missing prerequisite record
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, RosterError::IntegrityViolation { .. })
    }

    /// Whether the caller may retry after re-reading state
    ///
    /// Only conflicts qualify. Whether regenerating an identifier is safe
    /// remains the caller's decision.
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }

    /// The rejected commit, if this is a conflict
    pub fn rejection(&self) -> Option<&CommitRejection> {
        match self {
            RosterError::Conflict { rejection, .. } => Some(rejection),
            _ => None,
        }
    }
}

impl From<rmp_serde::encode::Error> for RosterError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        RosterError::serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for RosterError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        RosterError::serialization(e.to_string())
    }
}

impl From<KeyError> for RosterError {
    fn from(e: KeyError) -> Self {
        RosterError::invalid_input(e.to_string())
    }
}

impl From<LimitError> for RosterError {
    fn from(e: LimitError) -> Self {
        RosterError::invalid_input(e.to_string())
    }
}
