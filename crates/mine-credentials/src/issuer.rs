//! Decoy credential issuance.
//!
//! Issuing a mine creates a quarantined decoy principal, exactly one
//! credential pair for it, and the armed record tracking it. Principal
//! and key creation are one logical unit: if the key (or the record)
//! cannot be created after the principal exists, the failure names the
//! orphaned principal so the caller can clean it up.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use mine_store::{AccessKeyId, MineRecord, MineStore, SecretAccessKey};

use crate::backend::{CredentialBackend, QuarantinePolicy};
use crate::error::{BackendError, CredentialError, Result};

/// Configuration for the issuer.
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// Prefix for generated decoy principal names.
    pub username_prefix: String,
    /// How many freshly generated names to try on collisions.
    pub max_name_attempts: u32,
    /// Quarantine policy applied to every decoy principal.
    pub quarantine: QuarantinePolicy,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            username_prefix: "devops-admin".to_string(),
            max_name_attempts: 3,
            quarantine: QuarantinePolicy::default(),
        }
    }
}

/// The issuance response: the only place the plaintext secret leaves the
/// system besides the mine store.
#[derive(Debug, Clone)]
pub struct IssuedMine {
    /// The decoy principal's name.
    pub username: String,
    /// The new credential pair's identifier.
    pub access_key_id: AccessKeyId,
    /// The new credential pair's plaintext secret, returned exactly once.
    pub secret_access_key: SecretAccessKey,
}

/// Creates decoy principals and their credential pairs.
pub struct Issuer {
    backend: Arc<dyn CredentialBackend>,
    store: Arc<dyn MineStore>,
    config: IssuerConfig,
}

impl Issuer {
    /// Creates an issuer with the default configuration.
    #[must_use]
    pub fn new(backend: Arc<dyn CredentialBackend>, store: Arc<dyn MineStore>) -> Self {
        Self::with_config(backend, store, IssuerConfig::default())
    }

    /// Creates an issuer with a custom configuration.
    #[must_use]
    pub fn with_config(
        backend: Arc<dyn CredentialBackend>,
        store: Arc<dyn MineStore>,
        config: IssuerConfig,
    ) -> Self {
        Self {
            backend,
            store,
            config,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Issues one decoy credential pair and stores its armed record.
    ///
    /// # Errors
    ///
    /// Returns `PartialIssuance` if key creation or record storage fails
    /// after the principal was created; the error names the orphaned
    /// principal. Backend errors other than name collisions are not
    /// retried.
    pub fn issue(&self, description: &str) -> Result<IssuedMine> {
        let username = self.create_principal_with_fresh_name()?;

        let pair = match self.backend.create_access_key(&username) {
            Ok(pair) => pair,
            Err(err) => {
                error!(
                    %username,
                    error = %err,
                    "key creation failed after principal creation; principal is orphaned"
                );
                return Err(CredentialError::PartialIssuance {
                    username,
                    access_key_id: None,
                    reason: format!("key creation failed: {err}"),
                });
            }
        };

        let record = MineRecord::armed(
            pair.access_key_id.clone(),
            username.clone(),
            pair.secret_access_key.clone(),
            description,
        );

        if let Err(err) = self.store.put(record) {
            error!(
                %username,
                access_key_id = %pair.access_key_id,
                error = %err,
                "record storage failed after credential creation; principal is orphaned"
            );
            return Err(CredentialError::PartialIssuance {
                username,
                access_key_id: Some(pair.access_key_id.to_string()),
                reason: format!("record storage failed: {err}"),
            });
        }

        info!(
            %username,
            access_key_id = %pair.access_key_id,
            "issued decoy credential"
        );

        Ok(IssuedMine {
            username,
            access_key_id: pair.access_key_id,
            secret_access_key: pair.secret_access_key,
        })
    }

    /// Creates the decoy principal, retrying name collisions with a
    /// freshly generated unique name.
    fn create_principal_with_fresh_name(&self) -> Result<String> {
        let attempts = self.config.max_name_attempts.max(1);

        for attempt in 0..attempts {
            let username = format!("{}-{}", self.config.username_prefix, Uuid::new_v4());

            match self
                .backend
                .create_principal(&username, &self.config.quarantine)
            {
                Ok(()) => return Ok(username),
                Err(BackendError::AlreadyExists { .. }) if attempt + 1 < attempts => {
                    warn!(%username, attempt = attempt + 1, "principal name collision");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(CredentialError::Backend(BackendError::AlreadyExists {
            username: format!("{}-*", self.config.username_prefix),
        }))
    }
}

impl std::fmt::Debug for Issuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Issuer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
