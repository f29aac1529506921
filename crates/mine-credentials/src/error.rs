//! Error types for issuance and revocation.

use thiserror::Error;

/// Errors surfaced by the credential backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A principal with the generated name already exists. Issuance
    /// retries this with a freshly generated name.
    #[error("principal already exists: {username}")]
    AlreadyExists {
        /// The colliding principal name.
        username: String,
    },

    /// The named principal or access key does not exist. Idempotent
    /// delete paths treat this as success.
    #[error("not found: {name}")]
    NotFound {
        /// The missing principal or key identifier.
        name: String,
    },

    /// The quarantine permissions boundary could not be attached.
    /// Not retried.
    #[error("policy attachment denied: {reason}")]
    PolicyAttachmentDenied {
        /// The reason attachment was denied.
        reason: String,
    },

    /// A principal still has credentials attached and cannot be deleted.
    #[error("principal {username} still has attached credentials")]
    DeleteConflict {
        /// The principal that could not be deleted.
        username: String,
    },

    /// The backend is unreachable or failing. Not retried by issuance.
    #[error("credential backend unavailable: {reason}")]
    Unavailable {
        /// The reason the backend is unavailable.
        reason: String,
    },
}

/// Result type alias for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Errors surfaced by the issuer and revoker.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// A required input was missing or empty. The backend is not called.
    #[error("validation failed: {reason}")]
    Validation {
        /// The reason validation failed.
        reason: String,
    },

    /// Key creation or record storage failed after the principal was
    /// created, leaving an orphan that needs manual cleanup.
    #[error("partial issuance: orphaned principal {username}: {reason}")]
    PartialIssuance {
        /// The orphaned principal's name.
        username: String,
        /// The orphaned access key id, if key creation succeeded.
        access_key_id: Option<String>,
        /// What failed after the principal was created.
        reason: String,
    },

    /// The access key was deleted but the principal was not; principal
    /// deletion alone can be retried.
    #[error("partial disarm: principal {username} not deleted: {reason}")]
    PartialDisarm {
        /// The principal that remains.
        username: String,
        /// The already-deleted access key id.
        access_key_id: String,
        /// What failed after the key was deleted.
        reason: String,
    },

    /// A backend operation failed before any partial state existed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A mine store operation failed.
    #[error(transparent)]
    Store(#[from] mine_store::Error),
}

/// Result type alias for issuance and revocation operations.
pub type Result<T> = std::result::Result<T, CredentialError>;
