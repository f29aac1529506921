//! # mine-pipeline
//!
//! Audit-log batch ingestion and trip correlation for minefield.
//!
//! The log-routing collaborator delivers pre-filtered audit-log batches
//! as `base64(gzip(JSON envelope))`. The ingestion adapter decodes each
//! batch into ordered [`UsageEvent`]s; the [`TripCorrelator`] maps each
//! event to its mine record and performs the exactly-once armed→tripped
//! transition through the store's conditional update, publishing one
//! notification per first use.
//!
//! Batches may be processed concurrently and are delivered
//! at-least-once; duplicates and races collapse to a single trip per
//! arm cycle.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use mine_alerts::RecordingNotifier;
//! use mine_pipeline::{encode_batch, LogBatchEnvelope, TripCorrelator};
//! use mine_store::MemoryMineStore;
//!
//! let store = Arc::new(MemoryMineStore::new());
//! let notifier = Arc::new(RecordingNotifier::new());
//! let correlator = TripCorrelator::new(store, notifier);
//!
//! let payload = encode_batch(&LogBatchEnvelope::from_messages(vec![])).unwrap();
//! let outcome = correlator.process_batch(&payload).unwrap();
//! assert_eq!(outcome.events, 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod correlator;
pub mod error;
pub mod event;
pub mod ingest;

pub use correlator::{BatchOutcome, TripCorrelator};
pub use error::{PipelineError, Result};
pub use event::{LogBatchEnvelope, LogEntry, UsageEvent};
pub use ingest::{decode_batch, encode_batch, DecodedBatch};
