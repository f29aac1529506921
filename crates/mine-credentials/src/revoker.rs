//! Decoy credential revocation (disarm).
//!
//! Disarming deletes a mine's credential pair and its principal, in that
//! order, because backends reject principal deletion while credentials
//! remain attached. Missing keys or principals are treated as already
//! deleted, so disarm is idempotent.

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::CredentialBackend;
use crate::error::{BackendError, CredentialError};

/// The disarm result returned to the operator-facing caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisarmResponse {
    /// 200 on success, 400 on validation failure, 500 on backend failure.
    pub status_code: u16,
    /// Human-readable outcome description.
    pub body: String,
}

impl DisarmResponse {
    /// Returns true for a successful disarm.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Deletes decoy credential pairs and principals.
pub struct Revoker {
    backend: Arc<dyn CredentialBackend>,
}

impl Revoker {
    /// Creates a revoker over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn CredentialBackend>) -> Self {
        Self { backend }
    }

    /// Disarms a mine: deletes its access key, then its principal.
    ///
    /// Missing inputs yield a 400 without touching the backend. Missing
    /// keys or principals count as success so repeated disarms return
    /// 200. If the key is deleted but the principal is not, the response
    /// distinguishes partial completion so principal deletion alone can
    /// be retried.
    #[must_use]
    pub fn disarm(&self, username: &str, access_key_id: &str) -> DisarmResponse {
        match self.disarm_inner(username, access_key_id) {
            Ok(()) => {
                info!(username, access_key_id, "disarmed mine");
                DisarmResponse {
                    status_code: 200,
                    body: "decoy principal and credentials deleted".to_string(),
                }
            }
            Err(CredentialError::Validation { reason }) => DisarmResponse {
                status_code: 400,
                body: reason,
            },
            Err(CredentialError::PartialDisarm {
                username, reason, ..
            }) => DisarmResponse {
                status_code: 500,
                body: format!(
                    "access key deleted but principal {username} remains ({reason}); \
                     retry disarm to delete the principal"
                ),
            },
            Err(err) => DisarmResponse {
                status_code: 500,
                body: format!("disarm failed: {err}"),
            },
        }
    }

    fn disarm_inner(
        &self,
        username: &str,
        access_key_id: &str,
    ) -> Result<(), CredentialError> {
        if username.trim().is_empty() {
            return Err(CredentialError::Validation {
                reason: "missing username".to_string(),
            });
        }
        if access_key_id.trim().is_empty() {
            return Err(CredentialError::Validation {
                reason: "missing access key id".to_string(),
            });
        }

        match self.backend.delete_access_key(username, access_key_id) {
            Ok(()) | Err(BackendError::NotFound { .. }) => {}
            Err(err) => {
                warn!(username, access_key_id, error = %err, "access key deletion failed");
                return Err(err.into());
            }
        }

        match self.backend.delete_principal(username) {
            Ok(()) | Err(BackendError::NotFound { .. }) => Ok(()),
            Err(err) => {
                warn!(
                    username,
                    access_key_id,
                    error = %err,
                    "principal deletion failed after key deletion; principal remains"
                );
                Err(CredentialError::PartialDisarm {
                    username: username.to_string(),
                    access_key_id: access_key_id.to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }
}

impl std::fmt::Debug for Revoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Revoker").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        IssuedKeyPair, MemoryCredentialBackend, QuarantinePolicy,
    };
    use crate::error::BackendResult;
    use std::sync::atomic::{AtomicU32, Ordering};
    use test_case::test_case;

    fn backend_with_mine() -> (Arc<MemoryCredentialBackend>, String, String) {
        let backend = Arc::new(MemoryCredentialBackend::new());
        backend
            .create_principal("devops-admin-1", &QuarantinePolicy::default())
            .expect("create principal");
        let pair = backend
            .create_access_key("devops-admin-1")
            .expect("create key");
        (
            backend,
            "devops-admin-1".to_string(),
            pair.access_key_id.to_string(),
        )
    }

    #[test]
    fn disarm_deletes_key_and_principal() {
        let (backend, username, key_id) = backend_with_mine();
        let revoker = Revoker::new(backend.clone());

        let response = revoker.disarm(&username, &key_id);

        assert_eq!(response.status_code, 200);
        assert!(response.is_success());
        assert!(!backend.has_principal(&username));
    }

    #[test]
    fn disarm_twice_returns_200_both_times() {
        let (backend, username, key_id) = backend_with_mine();
        let revoker = Revoker::new(backend);

        let first = revoker.disarm(&username, &key_id);
        let second = revoker.disarm(&username, &key_id);

        assert_eq!(first.status_code, 200);
        assert_eq!(second.status_code, 200);
    }

    /// Backend that counts calls so validation tests can assert it was
    /// never reached.
    #[derive(Default)]
    struct CountingBackend {
        calls: AtomicU32,
    }

    impl CredentialBackend for CountingBackend {
        fn create_principal(
            &self,
            _username: &str,
            _quarantine: &QuarantinePolicy,
        ) -> BackendResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn create_access_key(&self, username: &str) -> BackendResult<IssuedKeyPair> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::NotFound {
                name: username.to_string(),
            })
        }

        fn delete_access_key(&self, _username: &str, _access_key_id: &str) -> BackendResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn delete_principal(&self, _username: &str) -> BackendResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test_case("", "AKIA123" ; "missing username")]
    #[test_case("   ", "AKIA123" ; "blank username")]
    #[test_case("devops-admin-1", "" ; "missing access key id")]
    #[test_case("devops-admin-1", "  " ; "blank access key id")]
    fn missing_input_yields_400_without_backend_call(username: &str, key_id: &str) {
        let backend = Arc::new(CountingBackend::default());
        let revoker = Revoker::new(backend.clone());

        let response = revoker.disarm(username, key_id);

        assert_eq!(response.status_code, 400);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    /// Backend whose principal deletion always fails.
    struct StickyPrincipalBackend {
        inner: MemoryCredentialBackend,
    }

    impl CredentialBackend for StickyPrincipalBackend {
        fn create_principal(
            &self,
            username: &str,
            quarantine: &QuarantinePolicy,
        ) -> BackendResult<()> {
            self.inner.create_principal(username, quarantine)
        }

        fn create_access_key(&self, username: &str) -> BackendResult<IssuedKeyPair> {
            self.inner.create_access_key(username)
        }

        fn delete_access_key(&self, username: &str, access_key_id: &str) -> BackendResult<()> {
            self.inner.delete_access_key(username, access_key_id)
        }

        fn delete_principal(&self, _username: &str) -> BackendResult<()> {
            Err(BackendError::Unavailable {
                reason: "principal service down".to_string(),
            })
        }
    }

    #[test]
    fn partial_disarm_is_distinguished_in_the_response() {
        let inner = MemoryCredentialBackend::new();
        inner
            .create_principal("devops-admin-1", &QuarantinePolicy::default())
            .expect("create principal");
        let pair = inner
            .create_access_key("devops-admin-1")
            .expect("create key");
        let backend = Arc::new(StickyPrincipalBackend { inner });
        let revoker = Revoker::new(backend.clone());

        let response = revoker.disarm("devops-admin-1", pair.access_key_id.as_str());

        assert_eq!(response.status_code, 500);
        assert!(response.body.contains("devops-admin-1"));
        assert!(response.body.contains("retry"));
        // The key really is gone; only the principal remains.
        assert!(backend.inner.has_principal("devops-admin-1"));
        assert!(matches!(
            backend
                .inner
                .delete_access_key("devops-admin-1", pair.access_key_id.as_str()),
            Err(BackendError::NotFound { .. })
        ));
    }

    #[test]
    fn key_deletion_failure_is_a_plain_500() {
        struct DownBackend;

        impl CredentialBackend for DownBackend {
            fn create_principal(
                &self,
                _username: &str,
                _quarantine: &QuarantinePolicy,
            ) -> BackendResult<()> {
                Err(BackendError::Unavailable {
                    reason: "down".to_string(),
                })
            }

            fn create_access_key(&self, username: &str) -> BackendResult<IssuedKeyPair> {
                Err(BackendError::NotFound {
                    name: username.to_string(),
                })
            }

            fn delete_access_key(
                &self,
                _username: &str,
                _access_key_id: &str,
            ) -> BackendResult<()> {
                Err(BackendError::Unavailable {
                    reason: "key service down".to_string(),
                })
            }

            fn delete_principal(&self, _username: &str) -> BackendResult<()> {
                Ok(())
            }
        }

        let revoker = Revoker::new(Arc::new(DownBackend));
        let response = revoker.disarm("devops-admin-1", "AKIA123");

        assert_eq!(response.status_code, 500);
        assert!(!response.body.contains("retry disarm"));
    }
}
