//! Error types for trip notification delivery.

use thiserror::Error;

/// Errors that can occur while publishing a trip alert.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Invalid channel configuration.
    #[error("invalid channel config: {reason}")]
    InvalidConfig {
        /// The reason the configuration is invalid.
        reason: String,
    },

    /// The alert could not be delivered through the channel.
    #[error("notification via {channel} failed: {reason}")]
    PublishFailed {
        /// The channel that failed.
        channel: String,
        /// The reason delivery failed.
        reason: String,
        /// Whether a retry may succeed.
        transient: bool,
    },

    /// The alert payload could not be serialized.
    #[error("alert serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NotifyError {
    /// Returns true if retrying the publish may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::PublishFailed { transient: true, .. })
    }
}

/// Result type alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
