//! Trip correlation.
//!
//! Maps decoded usage events to mine records and performs the
//! exactly-once armed→tripped transition. Many batches may run
//! concurrently and delivery is at-least-once, so the transition goes
//! through the store's conditional update: of all processors that
//! observe an armed record, exactly one wins the swap and publishes the
//! notification; every other attempt loses with a conflict and stays
//! silent.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use mine_alerts::{TripAlert, TripNotifier};
use mine_store::{Error as StoreError, MineStore};

use crate::error::Result;
use crate::event::UsageEvent;
use crate::ingest::decode_batch;

/// Counters describing what one batch invocation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Usage events processed.
    pub events: usize,
    /// Mines tripped by this invocation.
    pub trips: usize,
    /// Events against mines that were already tripped.
    pub repeats: usize,
    /// Trip attempts lost to a concurrent or duplicate delivery.
    pub conflicts: usize,
    /// Events whose key matched no record.
    pub unknown_keys: usize,
    /// Entries skipped by the adapter as undecodable.
    pub entry_decode_failures: usize,
    /// Entries that failed on a store error and were skipped.
    pub entry_errors: usize,
    /// Trips whose notification could not be delivered.
    pub notify_failures: usize,
}

/// Correlates usage events against mine records and notifies on first
/// trip.
pub struct TripCorrelator {
    store: Arc<dyn MineStore>,
    notifier: Arc<dyn TripNotifier>,
}

impl TripCorrelator {
    /// Creates a correlator over the given store and notifier.
    #[must_use]
    pub fn new(store: Arc<dyn MineStore>, notifier: Arc<dyn TripNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Decodes a batch payload and processes its events in delivery
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `BatchDecode` if the outer envelope cannot be decoded;
    /// no entries are processed in that case. Per-entry failures are
    /// counted in the outcome and never abort the batch.
    pub fn process_batch(&self, payload: &str) -> Result<BatchOutcome> {
        let batch = decode_batch(payload)?;

        let mut outcome = BatchOutcome {
            entry_decode_failures: batch.entry_failures,
            ..BatchOutcome::default()
        };

        for event in &batch.events {
            outcome.events += 1;
            self.handle_event(event, &mut outcome);
        }

        info!(
            events = outcome.events,
            trips = outcome.trips,
            repeats = outcome.repeats,
            conflicts = outcome.conflicts,
            unknown_keys = outcome.unknown_keys,
            entry_decode_failures = outcome.entry_decode_failures,
            entry_errors = outcome.entry_errors,
            notify_failures = outcome.notify_failures,
            "processed log batch"
        );

        Ok(outcome)
    }

    /// Processes already-decoded events in order, for callers that do
    /// their own ingestion.
    #[must_use]
    pub fn process_events(&self, events: &[UsageEvent]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for event in events {
            outcome.events += 1;
            self.handle_event(event, &mut outcome);
        }
        outcome
    }

    fn handle_event(&self, event: &UsageEvent, outcome: &mut BatchOutcome) {
        let record = match self.store.get(&event.access_key_id) {
            Ok(record) => record,
            Err(StoreError::NotFound { .. }) => {
                // Unknown or already-deleted decoys produce no effect.
                debug!(access_key_id = %event.access_key_id, "no record for usage event");
                outcome.unknown_keys += 1;
                return;
            }
            Err(err) => {
                warn!(
                    access_key_id = %event.access_key_id,
                    error = %err,
                    "store lookup failed, skipping entry"
                );
                outcome.entry_errors += 1;
                return;
            }
        };

        if record.tripped {
            // Informational only; the record is the source of truth and
            // is not touched again until re-armed.
            warn!(
                access_key_id = %event.access_key_id,
                event_name = %event.event_name,
                event_source = %event.event_source,
                aws_region = %event.aws_region,
                user_agent = %event.user_agent,
                source_ip_address = %event.source_ip_address,
                "repeated usage of tripped mine"
            );
            outcome.repeats += 1;
            return;
        }

        match self.store.trip(&event.access_key_id, event.event_time) {
            Ok(updated) => {
                outcome.trips += 1;
                info!(
                    access_key_id = %event.access_key_id,
                    event_time = %event.event_time,
                    source_ip_address = %event.source_ip_address,
                    "mine tripped"
                );

                let alert = TripAlert::new(
                    updated.access_key_id.as_str(),
                    updated.description.clone(),
                    event.event_time,
                );
                if let Err(err) = self.notifier.publish_trip(&alert) {
                    // State truth and notification delivery are
                    // decoupled; the trip stays committed.
                    error!(
                        access_key_id = %event.access_key_id,
                        error = %err,
                        "trip notification failed"
                    );
                    outcome.notify_failures += 1;
                }
            }
            Err(StoreError::Conflict { .. }) => {
                // A concurrent or duplicate delivery won the race.
                debug!(
                    access_key_id = %event.access_key_id,
                    "lost trip race, suppressing duplicate notification"
                );
                outcome.conflicts += 1;
            }
            Err(StoreError::NotFound { .. }) => {
                // Deleted between lookup and update.
                debug!(access_key_id = %event.access_key_id, "record gone before trip");
                outcome.unknown_keys += 1;
            }
            Err(err) => {
                warn!(
                    access_key_id = %event.access_key_id,
                    error = %err,
                    "trip update failed, skipping entry"
                );
                outcome.entry_errors += 1;
            }
        }
    }
}

impl std::fmt::Debug for TripCorrelator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripCorrelator").finish_non_exhaustive()
    }
}
