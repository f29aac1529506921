//! Usage events and the log-batch wire format.
//!
//! A batch arrives as base64-encoded gzip of a JSON envelope holding an
//! ordered sequence of entries; each entry's `message` field embeds one
//! audit event as a JSON string. The envelope carries routing metadata
//! from the log-routing collaborator which the pipeline tolerates but
//! does not act on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mine_store::AccessKeyId;

/// One decoded usage of a credential, derived from a log entry.
///
/// Transient: events drive the trip transition and are not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEvent {
    /// The access key the event was made with.
    pub access_key_id: AccessKeyId,
    /// When the usage happened.
    pub event_time: DateTime<Utc>,
    /// The API action name.
    pub event_name: String,
    /// The service the action was made against.
    pub event_source: String,
    /// The region the action was made in.
    pub aws_region: String,
    /// The caller's user agent.
    pub user_agent: String,
    /// The caller's source address.
    pub source_ip_address: String,
}

/// The outer batch envelope delivered by the log router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBatchEnvelope {
    /// Routing metadata; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    /// Source log group; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_group: Option<String>,
    /// Source log stream; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_stream: Option<String>,
    /// Subscription filters that matched; informational only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subscription_filters: Vec<String>,
    /// The ordered entries of this batch.
    pub log_events: Vec<LogEntry>,
}

impl LogBatchEnvelope {
    /// Creates an envelope holding the given entry messages, in order.
    #[must_use]
    pub fn from_messages(messages: impl IntoIterator<Item = String>) -> Self {
        Self {
            message_type: Some("DATA_MESSAGE".to_string()),
            log_group: None,
            log_stream: None,
            subscription_filters: Vec::new(),
            log_events: messages.into_iter().map(LogEntry::new).collect(),
        }
    }
}

/// One entry of a batch envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// The embedded audit event, as a JSON string.
    pub message: String,
}

impl LogEntry {
    /// Creates an entry wrapping the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The audit event embedded in an entry's `message` field.
///
/// Only the caller identity and event time are required; the remaining
/// fields default to empty when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawAuditEvent {
    pub user_identity: RawUserIdentity,
    pub event_time: DateTime<Utc>,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub event_source: String,
    #[serde(default)]
    pub aws_region: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default, rename = "sourceIPAddress")]
    pub source_ip_address: String,
}

/// The caller identity of an embedded audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawUserIdentity {
    pub access_key_id: String,
}
