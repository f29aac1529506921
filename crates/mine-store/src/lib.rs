//! # mine-store
//!
//! Keyed storage for decoy-credential ("mine") records.
//!
//! A mine record tracks one decoy credential pair from issuance through
//! first detected use. The store's conditional update is the only way the
//! armed→tripped transition happens, which makes that transition
//! exactly-once under concurrent batch processing and at-least-once
//! delivery.
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use mine_store::{AccessKeyId, MemoryMineStore, MineRecord, MineStore, SecretAccessKey};
//!
//! let store = MemoryMineStore::new();
//! let key = AccessKeyId::new("AKIAEXAMPLE").unwrap();
//!
//! store
//!     .put(MineRecord::armed(
//!         key.clone(),
//!         "devops-admin-1234",
//!         SecretAccessKey::new("plaintext-secret"),
//!         "decoy for repo X",
//!     ))
//!     .unwrap();
//!
//! // First trip wins...
//! assert!(store.trip(&key, Utc::now()).is_ok());
//! // ...every later attempt loses with a conflict.
//! assert!(store.trip(&key, Utc::now()).is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use store::{MemoryMineStore, MineStore};
pub use types::{AccessKeyId, MineRecord, SecretAccessKey, TripState};
