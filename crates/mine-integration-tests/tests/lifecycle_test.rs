//! Integration tests for the full mine lifecycle.
//!
//! Tests the complete flow across crates:
//! 1. Issue a decoy credential pair and its armed record
//! 2. Deliver audit-log batches and trip the mine exactly once
//! 3. Re-arm and trip again in a new cycle
//! 4. Disarm idempotently

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use mine_alerts::RecordingNotifier;
use mine_credentials::{Issuer, MemoryCredentialBackend, Revoker};
use mine_pipeline::{encode_batch, LogBatchEnvelope, TripCorrelator};
use mine_store::{MemoryMineStore, MineStore};

// ============================================================================
// Helper Functions
// ============================================================================

struct Fixture {
    backend: Arc<MemoryCredentialBackend>,
    store: Arc<MemoryMineStore>,
    notifier: Arc<RecordingNotifier>,
    issuer: Issuer,
    revoker: Revoker,
    correlator: TripCorrelator,
}

impl Fixture {
    fn new() -> Self {
        let backend = Arc::new(MemoryCredentialBackend::new());
        let store = Arc::new(MemoryMineStore::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let issuer = Issuer::new(backend.clone(), store.clone());
        let revoker = Revoker::new(backend.clone());
        let correlator = TripCorrelator::new(store.clone(), notifier.clone());

        Self {
            backend,
            store,
            notifier,
            issuer,
            revoker,
            correlator,
        }
    }
}

fn usage_message(key_id: &str, event_time: DateTime<Utc>) -> String {
    format!(
        r#"{{"userIdentity":{{"accessKeyId":"{key_id}"}},"eventTime":"{}","eventName":"GetCallerIdentity","eventSource":"sts.amazonaws.com","awsRegion":"us-east-1","userAgent":"aws-cli/2.15.0","sourceIPAddress":"203.0.113.7"}}"#,
        event_time.to_rfc3339()
    )
}

fn batch_payload(messages: Vec<String>) -> String {
    encode_batch(&LogBatchEnvelope::from_messages(messages)).expect("encode batch")
}

fn t(min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 17, 9, min, 0).single().expect("valid time")
}

// ============================================================================
// Issue → Trip → Notify
// ============================================================================

#[test]
fn issue_then_get_returns_armed_record() {
    let fx = Fixture::new();

    let issued = fx.issuer.issue("decoy for repo X").expect("issue");

    assert!(!issued.access_key_id.as_str().is_empty());
    assert!(!issued.secret_access_key.is_empty());

    let record = fx.store.get(&issued.access_key_id).expect("get");
    assert!(!record.tripped);
    assert!(record.tripped_at.is_none());
    assert_eq!(record.description, "decoy for repo X");
}

#[test]
fn first_use_trips_once_and_renders_the_alert_message() {
    let fx = Fixture::new();
    let issued = fx.issuer.issue("decoy for repo X").expect("issue");

    let payload = batch_payload(vec![usage_message(issued.access_key_id.as_str(), t(30))]);
    let outcome = fx.correlator.process_batch(&payload).expect("process");

    assert_eq!(outcome.trips, 1);
    assert_eq!(fx.notifier.publish_count(), 1);

    let alert = &fx.notifier.published()[0];
    assert_eq!(
        alert.message(),
        format!(
            "Mine with access key ID {} and description decoy for repo X \
             has been tripped at 2024-05-17T09:30:00Z.",
            issued.access_key_id
        )
    );
}

#[test]
fn duplicate_delivery_yields_at_most_one_notification_per_arm_cycle() {
    let fx = Fixture::new();
    let issued = fx.issuer.issue("decoy").expect("issue");

    let payload = batch_payload(vec![usage_message(issued.access_key_id.as_str(), t(30))]);
    fx.correlator.process_batch(&payload).expect("first");
    fx.correlator.process_batch(&payload).expect("duplicate");
    fx.correlator.process_batch(&payload).expect("triplicate");

    assert_eq!(fx.notifier.publish_count(), 1);

    let record = fx.store.get(&issued.access_key_id).expect("get");
    assert!(record.tripped);
    assert_eq!(record.tripped_at, Some(t(30)));
}

#[test]
fn in_batch_ordering_determines_tripped_at() {
    let fx = Fixture::new();
    let issued = fx.issuer.issue("decoy").expect("issue");
    let key = issued.access_key_id.as_str();

    let payload = batch_payload(vec![usage_message(key, t(30)), usage_message(key, t(45))]);
    fx.correlator.process_batch(&payload).expect("process");

    let record = fx.store.get(&issued.access_key_id).expect("get");
    assert_eq!(record.tripped_at, Some(t(30)));
}

// ============================================================================
// Re-arm cycle
// ============================================================================

#[test]
fn rearm_starts_a_fresh_cycle_with_its_own_single_notification() {
    let fx = Fixture::new();
    let issued = fx.issuer.issue("decoy").expect("issue");
    let key = issued.access_key_id.as_str();

    fx.correlator
        .process_batch(&batch_payload(vec![usage_message(key, t(30))]))
        .expect("first cycle");
    assert_eq!(fx.notifier.publish_count(), 1);

    fx.store.rearm(&issued.access_key_id).expect("rearm");
    let rearmed = fx.store.get(&issued.access_key_id).expect("get");
    assert!(!rearmed.tripped);
    assert!(rearmed.tripped_at.is_none());

    let payload = batch_payload(vec![usage_message(key, t(50))]);
    fx.correlator.process_batch(&payload).expect("second cycle");
    fx.correlator.process_batch(&payload).expect("duplicate");

    assert_eq!(fx.notifier.publish_count(), 2);
    let record = fx.store.get(&issued.access_key_id).expect("get");
    assert_eq!(record.tripped_at, Some(t(50)));
}

// ============================================================================
// Disarm
// ============================================================================

#[test]
fn disarm_twice_returns_200_both_times() {
    let fx = Fixture::new();
    let issued = fx.issuer.issue("decoy").expect("issue");

    let first = fx
        .revoker
        .disarm(&issued.username, issued.access_key_id.as_str());
    let second = fx
        .revoker
        .disarm(&issued.username, issued.access_key_id.as_str());

    assert_eq!(first.status_code, 200);
    assert_eq!(second.status_code, 200);
    assert!(!fx.backend.has_principal(&issued.username));
}

#[test]
fn disarm_with_missing_input_never_reaches_the_backend() {
    let fx = Fixture::new();
    let issued = fx.issuer.issue("decoy").expect("issue");

    let response = fx.revoker.disarm("", issued.access_key_id.as_str());

    assert_eq!(response.status_code, 400);
    // The decoy is untouched.
    assert!(fx.backend.has_principal(&issued.username));
}

#[test]
fn events_after_disarm_are_ignored_once_the_record_is_removed() {
    let fx = Fixture::new();
    let issued = fx.issuer.issue("decoy").expect("issue");

    let response = fx
        .revoker
        .disarm(&issued.username, issued.access_key_id.as_str());
    assert_eq!(response.status_code, 200);

    // The excluded caller removes the record after a successful disarm.
    fx.store.delete(&issued.access_key_id).expect("delete");

    let payload = batch_payload(vec![usage_message(issued.access_key_id.as_str(), t(30))]);
    let outcome = fx.correlator.process_batch(&payload).expect("process");

    assert_eq!(outcome.unknown_keys, 1);
    assert_eq!(outcome.trips, 0);
    assert_eq!(fx.notifier.publish_count(), 0);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn concurrent_duplicate_batches_trip_exactly_once() {
    use std::thread;

    let fx = Fixture::new();
    let issued = fx.issuer.issue("decoy").expect("issue");

    let correlator = Arc::new(TripCorrelator::new(fx.store.clone(), fx.notifier.clone()));
    let payload = batch_payload(vec![usage_message(issued.access_key_id.as_str(), t(30))]);

    let mut handles = vec![];
    for _ in 0..8 {
        let correlator = Arc::clone(&correlator);
        let payload = payload.clone();
        handles.push(thread::spawn(move || {
            correlator.process_batch(&payload).expect("process").trips
        }));
    }

    let total: usize = handles
        .into_iter()
        .map(|h| h.join().expect("thread should complete"))
        .sum();

    assert_eq!(total, 1);
    assert_eq!(fx.notifier.publish_count(), 1);
}

// ============================================================================
// Mixed batches
// ============================================================================

#[test]
fn one_batch_covering_many_mines_and_garbage_entries() {
    let fx = Fixture::new();
    let first = fx.issuer.issue("first decoy").expect("issue first");
    let second = fx.issuer.issue("second decoy").expect("issue second");

    let payload = batch_payload(vec![
        usage_message(first.access_key_id.as_str(), t(30)),
        "garbage entry".to_string(),
        usage_message("AKIAUNKNOWN00000", t(31)),
        usage_message(second.access_key_id.as_str(), t(32)),
    ]);

    let outcome = fx.correlator.process_batch(&payload).expect("process");

    assert_eq!(outcome.trips, 2);
    assert_eq!(outcome.unknown_keys, 1);
    assert_eq!(outcome.entry_decode_failures, 1);
    assert_eq!(fx.notifier.publish_count(), 2);

    let descriptions: Vec<String> = fx
        .notifier
        .published()
        .iter()
        .map(|a| a.description.clone())
        .collect();
    assert!(descriptions.contains(&"first decoy".to_string()));
    assert!(descriptions.contains(&"second decoy".to_string()));
}
