//! Error types for the log-batch pipeline.

use thiserror::Error;

/// Errors that can occur while processing a log batch.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The outer batch envelope could not be decoded. No entries are
    /// processed. Individual malformed entries are not errors; they are
    /// skipped and counted instead.
    #[error("batch decode failed: {reason}")]
    BatchDecode {
        /// The stage and cause of the decode failure.
        reason: String,
    },

    /// A store operation failed outside any single entry's scope.
    #[error(transparent)]
    Store(#[from] mine_store::Error),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_decode_display_names_the_cause() {
        let err = PipelineError::BatchDecode {
            reason: "invalid base64".to_string(),
        };
        assert_eq!(err.to_string(), "batch decode failed: invalid base64");
    }
}
