//! # mine-alerts
//!
//! Trip notification delivery for minefield.
//!
//! When a decoy credential is used for the first time, the correlator
//! publishes exactly one [`TripAlert`] through a [`TripNotifier`]
//! channel. Delivery is decoupled from trip state: a failed notification
//! never rolls back the committed trip.
//!
//! ## Features
//!
//! - [`TripAlert`] — the alert and its fixed-format message
//! - [`TripNotifier`] — pluggable trait for delivery channels
//! - [`TracingNotifier`], [`TopicNotifier`] — built-in channels
//! - [`RetryingNotifier`] — bounded retry with exponential backoff
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use mine_alerts::{RetryingNotifier, TopicConfig, TopicNotifier, TripAlert, TripNotifier};
//!
//! let config = TopicConfig::new("alerts", "arn:topic:mine-alerts").unwrap();
//! let notifier = RetryingNotifier::new(TopicNotifier::new(config));
//!
//! let alert = TripAlert::new("AKIAEXAMPLE", "decoy for repo X", Utc::now());
//! notifier.publish_trip(&alert).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod alert;
pub mod channels;
pub mod error;
pub mod retry;

pub use alert::TripAlert;
pub use channels::{
    NoopNotifier, RecordingNotifier, TopicConfig, TopicNotifier, TopicPayload, TracingNotifier,
    TripNotifier,
};
pub use error::{NotifyError, Result};
pub use retry::{RetryPolicy, RetryingNotifier};
