//! The trip alert and its fixed-format message.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A trip alert: one decoy credential observed in use for the first time
/// since it was armed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripAlert {
    /// The access key id of the tripped mine.
    pub access_key_id: String,
    /// The operator-supplied label of the mine.
    pub description: String,
    /// Event time of the usage that tripped the mine.
    pub event_time: DateTime<Utc>,
}

impl TripAlert {
    /// Creates a new trip alert.
    #[must_use]
    pub fn new(
        access_key_id: impl Into<String>,
        description: impl Into<String>,
        event_time: DateTime<Utc>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            description: description.into(),
            event_time,
        }
    }

    /// Renders the fixed-format, human-readable alert message.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Mine with access key ID {} and description {} has been tripped at {}.",
            self.access_key_id,
            self.description,
            self.event_time.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}
