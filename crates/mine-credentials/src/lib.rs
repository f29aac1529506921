//! # mine-credentials
//!
//! Decoy principal issuance and revocation for minefield.
//!
//! Issuance creates a quarantined decoy principal and exactly one
//! credential pair for it, then stores the armed mine record. Revocation
//! (disarm) deletes the credential pair and principal idempotently, key
//! first. Both talk to the credential system through the
//! [`CredentialBackend`] seam so deployments and tests can substitute
//! their own backend.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use mine_credentials::{Issuer, MemoryCredentialBackend, Revoker};
//! use mine_store::MemoryMineStore;
//!
//! let backend = Arc::new(MemoryCredentialBackend::new());
//! let store = Arc::new(MemoryMineStore::new());
//!
//! let issuer = Issuer::new(backend.clone(), store);
//! let issued = issuer.issue("decoy for repo X").unwrap();
//!
//! let revoker = Revoker::new(backend);
//! let response = revoker.disarm(&issued.username, issued.access_key_id.as_str());
//! assert_eq!(response.status_code, 200);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod issuer;
pub mod revoker;

pub use backend::{CredentialBackend, IssuedKeyPair, MemoryCredentialBackend, QuarantinePolicy};
pub use error::{BackendError, BackendResult, CredentialError, Result};
pub use issuer::{IssuedMine, Issuer, IssuerConfig};
pub use revoker::{DisarmResponse, Revoker};
