//! Error types for the mine record store.

use thiserror::Error;

/// Errors that can occur in the mine record store.
#[derive(Debug, Error)]
pub enum Error {
    /// Access-key identifier failed validation.
    #[error("invalid access key id: {reason}")]
    InvalidKey {
        /// The reason the identifier is invalid.
        reason: String,
    },

    /// No record exists for the given key.
    #[error("mine record not found: {key}")]
    NotFound {
        /// The key that was not found.
        key: String,
    },

    /// A conditional update observed a different `tripped` state than
    /// expected. The record was not modified.
    #[error("conditional update conflict on mine record: {key}")]
    Conflict {
        /// The key whose update lost the race.
        key: String,
    },

    /// The storage backend is unreachable or failing.
    #[error("mine store unavailable: {reason}")]
    Unavailable {
        /// The reason the backend is unavailable.
        reason: String,
    },
}

impl Error {
    /// Returns true for conditions a correlation pipeline treats as
    /// benign: a missing record or a lost conditional-update race.
    #[must_use]
    pub const fn is_benign(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Conflict { .. })
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;
