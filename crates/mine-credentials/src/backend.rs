//! The credential backend seam.
//!
//! This module provides the [`CredentialBackend`] trait that abstracts
//! the IAM-like system holding decoy principals and their credential
//! pairs, plus an in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;

use mine_store::{AccessKeyId, SecretAccessKey};

use crate::error::{BackendError, BackendResult};

/// The restrictive policy applied to every decoy principal so a leaked
/// credential cannot do real damage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantinePolicy {
    /// Identifier of the permissions boundary attached at creation.
    pub permissions_boundary: String,
    /// Tag key marking the principal as a decoy.
    pub tag_key: String,
    /// Tag value marking the principal as a decoy.
    pub tag_value: String,
}

impl Default for QuarantinePolicy {
    fn default() -> Self {
        Self {
            permissions_boundary: "arn:aws:iam::aws:policy/AWSCompromisedKeyQuarantineV2"
                .to_string(),
            tag_key: "aws-mine".to_string(),
            tag_value: "quarantined".to_string(),
        }
    }
}

/// A freshly created credential pair.
#[derive(Debug, Clone)]
pub struct IssuedKeyPair {
    /// The new key's identifier.
    pub access_key_id: AccessKeyId,
    /// The new key's plaintext secret.
    pub secret_access_key: SecretAccessKey,
}

/// The seam to the system that holds decoy principals and credentials.
///
/// All operations are short, bounded calls against an external backend;
/// implementations are responsible for per-call timeouts.
pub trait CredentialBackend: Send + Sync {
    /// Creates a decoy principal under the quarantine policy.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` on a name collision, which issuance
    /// retries with a fresh name.
    fn create_principal(&self, username: &str, quarantine: &QuarantinePolicy)
        -> BackendResult<()>;

    /// Creates one credential pair for an existing principal.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the principal does not exist.
    fn create_access_key(&self, username: &str) -> BackendResult<IssuedKeyPair>;

    /// Deletes a credential pair.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key does not exist.
    fn delete_access_key(&self, username: &str, access_key_id: &str) -> BackendResult<()>;

    /// Deletes a principal.
    ///
    /// # Errors
    ///
    /// Returns `DeleteConflict` while credentials remain attached,
    /// `NotFound` if the principal does not exist.
    fn delete_principal(&self, username: &str) -> BackendResult<()>;
}

#[derive(Debug, Default, Clone)]
struct PrincipalEntry {
    quarantine: Option<QuarantinePolicy>,
    access_keys: HashSet<String>,
}

/// In-memory [`CredentialBackend`] implementation.
///
/// Mirrors the deletion-ordering constraint of real backends: a
/// principal cannot be deleted while credentials remain attached.
#[derive(Debug, Default)]
pub struct MemoryCredentialBackend {
    principals: RwLock<HashMap<String, PrincipalEntry>>,
}

impl MemoryCredentialBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the principal currently exists.
    #[must_use]
    pub fn has_principal(&self, username: &str) -> bool {
        self.principals
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(username)
    }

    /// Returns the quarantine policy a principal was created under.
    #[must_use]
    pub fn quarantine_of(&self, username: &str) -> Option<QuarantinePolicy> {
        self.principals
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(username)
            .and_then(|p| p.quarantine.clone())
    }

    fn generate_key_id() -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        format!("AKIA{}", suffix.to_uppercase())
    }

    fn generate_secret() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(40)
            .map(char::from)
            .collect()
    }
}

impl CredentialBackend for MemoryCredentialBackend {
    fn create_principal(
        &self,
        username: &str,
        quarantine: &QuarantinePolicy,
    ) -> BackendResult<()> {
        let mut principals = self
            .principals
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if principals.contains_key(username) {
            return Err(BackendError::AlreadyExists {
                username: username.to_string(),
            });
        }

        principals.insert(
            username.to_string(),
            PrincipalEntry {
                quarantine: Some(quarantine.clone()),
                access_keys: HashSet::new(),
            },
        );
        debug!(username, "created decoy principal");

        Ok(())
    }

    fn create_access_key(&self, username: &str) -> BackendResult<IssuedKeyPair> {
        let mut principals = self
            .principals
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let entry = principals
            .get_mut(username)
            .ok_or_else(|| BackendError::NotFound {
                name: username.to_string(),
            })?;

        let key_id = Self::generate_key_id();
        entry.access_keys.insert(key_id.clone());
        debug!(username, access_key_id = %key_id, "created access key");

        let access_key_id =
            AccessKeyId::new(key_id).map_err(|err| BackendError::Unavailable {
                reason: format!("generated key id rejected: {err}"),
            })?;

        Ok(IssuedKeyPair {
            access_key_id,
            secret_access_key: SecretAccessKey::new(Self::generate_secret()),
        })
    }

    fn delete_access_key(&self, username: &str, access_key_id: &str) -> BackendResult<()> {
        let mut principals = self
            .principals
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let entry = principals
            .get_mut(username)
            .ok_or_else(|| BackendError::NotFound {
                name: username.to_string(),
            })?;

        if !entry.access_keys.remove(access_key_id) {
            return Err(BackendError::NotFound {
                name: access_key_id.to_string(),
            });
        }

        debug!(username, access_key_id, "deleted access key");
        Ok(())
    }

    fn delete_principal(&self, username: &str) -> BackendResult<()> {
        let mut principals = self
            .principals
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let entry = principals
            .get(username)
            .ok_or_else(|| BackendError::NotFound {
                name: username.to_string(),
            })?;

        if !entry.access_keys.is_empty() {
            return Err(BackendError::DeleteConflict {
                username: username.to_string(),
            });
        }

        principals.remove(username);
        debug!(username, "deleted decoy principal");
        Ok(())
    }
}
