//! Record storage with conditional trip transitions.
//!
//! This module provides the [`MineStore`] trait and the in-memory
//! implementation. The conditional update is the sole mechanism by which
//! the armed→tripped transition is made exactly-once under concurrent or
//! duplicate delivery.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{AccessKeyId, MineRecord, TripState};

/// Keyed storage for decoy-credential records.
///
/// Implementations must provide strongly-consistent reads and
/// compare-and-swap writes on the `tripped` flag. The issuer, correlator,
/// and revoker are the only intended writers, all keyed by access key id.
pub trait MineStore: Send + Sync {
    /// Stores a record, replacing any existing record under the same key.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the backend cannot be reached.
    fn put(&self, record: MineRecord) -> Result<()>;

    /// Retrieves the record for a key with strong consistency.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists for the key.
    fn get(&self, key: &AccessKeyId) -> Result<MineRecord>;

    /// Atomically replaces the trip state of a record, but only if the
    /// record's current `tripped` flag equals `expected_tripped`.
    ///
    /// On success the updated record is returned. On mismatch the record
    /// is untouched and `Conflict` is returned; this is how concurrent
    /// trip attempts collapse to a single winner.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists, `Conflict` if the current
    /// state does not match the expectation.
    fn conditional_update(
        &self,
        key: &AccessKeyId,
        expected_tripped: bool,
        new_state: TripState,
    ) -> Result<MineRecord>;

    /// Deletes the record for a key.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists for the key.
    fn delete(&self, key: &AccessKeyId) -> Result<()>;

    /// Lists all stored records.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the backend cannot be reached.
    fn list(&self) -> Result<Vec<MineRecord>>;

    /// Transitions an armed record to tripped at the given event time.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the record is already tripped.
    fn trip(&self, key: &AccessKeyId, at: DateTime<Utc>) -> Result<MineRecord> {
        self.conditional_update(key, false, TripState::Tripped { at })
    }

    /// Resets a tripped record to armed, clearing the trip timestamp and
    /// starting a new arm cycle.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the record is not currently tripped.
    fn rearm(&self, key: &AccessKeyId) -> Result<MineRecord> {
        self.conditional_update(key, true, TripState::Armed)
    }
}

/// In-memory [`MineStore`] implementation.
///
/// The write lock is held across the compare and the swap of
/// [`conditional_update`](MineStore::conditional_update), so the
/// armed→tripped race has exactly one winner regardless of how many
/// threads observe the same key.
#[derive(Default)]
pub struct MemoryMineStore {
    records: RwLock<HashMap<AccessKeyId, MineRecord>>,
}

impl MemoryMineStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Returns true if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MineStore for MemoryMineStore {
    fn put(&self, mut record: MineRecord) -> Result<()> {
        record.updated_at = Utc::now();

        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        debug!(key = %record.access_key_id, "stored mine record");
        records.insert(record.access_key_id.clone(), record);

        Ok(())
    }

    fn get(&self, key: &AccessKeyId) -> Result<MineRecord> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        records.get(key).cloned().ok_or_else(|| Error::NotFound {
            key: key.to_string(),
        })
    }

    fn conditional_update(
        &self,
        key: &AccessKeyId,
        expected_tripped: bool,
        new_state: TripState,
    ) -> Result<MineRecord> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let record = records.get_mut(key).ok_or_else(|| Error::NotFound {
            key: key.to_string(),
        })?;

        if record.tripped != expected_tripped {
            return Err(Error::Conflict {
                key: key.to_string(),
            });
        }

        record.apply_trip_state(new_state);
        debug!(
            key = %key,
            tripped = new_state.is_tripped(),
            "applied conditional trip update"
        );

        Ok(record.clone())
    }

    fn delete(&self, key: &AccessKeyId) -> Result<()> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if records.remove(key).is_none() {
            return Err(Error::NotFound {
                key: key.to_string(),
            });
        }

        debug!(key = %key, "deleted mine record");
        Ok(())
    }

    fn list(&self) -> Result<Vec<MineRecord>> {
        let records = self
            .records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        Ok(records.values().cloned().collect())
    }
}

impl std::fmt::Debug for MemoryMineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMineStore")
            .field("records_count", &self.len())
            .finish()
    }
}
