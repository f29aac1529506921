//! Notification channels for trip alert delivery.
//!
//! This module provides the [`TripNotifier`] trait and implementations
//! for delivering trip alerts through various channels.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::alert::TripAlert;
use crate::error::{NotifyError, Result};

/// Trait for trip notification channels.
///
/// Implement this trait to deliver alerts via different protocols or
/// services. Publishing is decoupled from trip state: a committed trip is
/// never rolled back because its notification failed.
pub trait TripNotifier: Send + Sync + fmt::Debug {
    /// Returns the name of this channel.
    fn name(&self) -> &str;

    /// Publishes a trip alert through this channel.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::PublishFailed` if the alert cannot be sent.
    fn publish_trip(&self, alert: &TripAlert) -> Result<()>;

    /// Returns true if this channel is enabled.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Channel that emits trip alerts through the `tracing` infrastructure.
///
/// A tripped mine is a security incident, so alerts are logged at error
/// level regardless of subscriber configuration.
#[derive(Debug, Clone)]
pub struct TracingNotifier {
    name: String,
}

impl TracingNotifier {
    /// Creates a new tracing-backed channel.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for TracingNotifier {
    fn default() -> Self {
        Self::new("tracing")
    }
}

impl TripNotifier for TracingNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn publish_trip(&self, alert: &TripAlert) -> Result<()> {
        error!(
            access_key_id = %alert.access_key_id,
            description = %alert.description,
            event_time = %alert.event_time,
            "{}",
            alert.message()
        );
        Ok(())
    }
}

/// Configuration for a pub/sub topic channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    /// The name of this channel.
    pub name: String,
    /// Identifier of the topic to publish to.
    pub topic_id: String,
    /// Timeout in seconds for publish requests.
    pub timeout_secs: u64,
    /// Whether this channel is enabled.
    pub enabled: bool,
}

impl TopicConfig {
    /// Creates a new topic configuration.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::InvalidConfig` if the topic id is empty.
    pub fn new(name: impl Into<String>, topic_id: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let topic_id = topic_id.into();
        if topic_id.is_empty() {
            return Err(NotifyError::InvalidConfig {
                reason: "topic id cannot be empty".to_string(),
            });
        }

        Ok(Self {
            name,
            topic_id,
            timeout_secs: 30,
            enabled: true,
        })
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets whether the channel is enabled.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// The payload format published to the topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPayload {
    /// The access key id of the tripped mine.
    pub access_key_id: String,
    /// The operator-supplied label of the mine.
    pub description: String,
    /// Event time of the usage that tripped the mine.
    pub event_time: String,
    /// The rendered human-readable message.
    pub message: String,
}

impl TopicPayload {
    /// Creates a payload from a trip alert.
    #[must_use]
    pub fn from_alert(alert: &TripAlert) -> Self {
        Self {
            access_key_id: alert.access_key_id.clone(),
            description: alert.description.clone(),
            event_time: alert.event_time.to_rfc3339(),
            message: alert.message(),
        }
    }
}

/// A pub/sub topic notification channel.
///
/// Publishes trip alerts as JSON messages to a configured topic.
#[derive(Debug, Clone)]
pub struct TopicNotifier {
    config: TopicConfig,
}

impl TopicNotifier {
    /// Creates a new topic channel with the given configuration.
    #[must_use]
    pub const fn new(config: TopicConfig) -> Self {
        Self { config }
    }

    /// Returns the configured topic identifier.
    #[must_use]
    pub fn topic_id(&self) -> &str {
        &self.config.topic_id
    }

    /// Formats the alert as the topic's JSON payload.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Serialization` if serialization fails.
    pub fn format_payload(&self, alert: &TripAlert) -> Result<String> {
        let payload = TopicPayload::from_alert(alert);
        serde_json::to_string(&payload).map_err(NotifyError::from)
    }
}

impl TripNotifier for TopicNotifier {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn publish_trip(&self, alert: &TripAlert) -> Result<()> {
        if !self.is_enabled() {
            debug!(channel = %self.name(), "channel is disabled, skipping");
            return Ok(());
        }

        let payload = self.format_payload(alert)?;

        // In a real deployment this is where the publish call to the
        // topic service goes, with `timeout_secs` applied per request.
        info!(
            channel = %self.name(),
            topic_id = %self.config.topic_id,
            access_key_id = %alert.access_key_id,
            "would publish trip notification"
        );
        debug!(payload = %payload, "topic payload");

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

/// A no-op channel for disabled scenarios.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl NoopNotifier {
    /// Creates a new no-op channel.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TripNotifier for NoopNotifier {
    fn name(&self) -> &str {
        "noop"
    }

    fn publish_trip(&self, _alert: &TripAlert) -> Result<()> {
        Ok(())
    }
}

/// A channel that records published alerts for inspection.
///
/// Useful as a test double and for dry runs.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    published: Mutex<Vec<TripAlert>>,
}

impl RecordingNotifier {
    /// Creates a new recording channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all alerts published so far.
    #[must_use]
    pub fn published(&self) -> Vec<TripAlert> {
        self.published
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of alerts published so far.
    #[must_use]
    pub fn publish_count(&self) -> usize {
        self.published
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

impl TripNotifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    fn publish_trip(&self, alert: &TripAlert) -> Result<()> {
        self.published
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(alert.clone());
        Ok(())
    }
}
