//! Log-batch decoding.
//!
//! The log-routing collaborator delivers each batch as
//! `base64(gzip(JSON envelope))`. The whole batch fails if the envelope
//! cannot be decoded; a malformed individual entry is skipped and
//! counted while the remaining entries proceed in delivery order.
//!
//! The collaborator has already restricted delivery to decoy-principal
//! traffic, so no filtering happens here. For `tripped_at` to reflect
//! the true first use, the collaborator must also deliver entries in
//! non-decreasing event-time order; this module preserves, and does not
//! create, that ordering.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, warn};

use mine_store::AccessKeyId;

use crate::error::{PipelineError, Result};
use crate::event::{LogBatchEnvelope, RawAuditEvent, UsageEvent};

/// The decoded contents of one batch.
#[derive(Debug, Clone, Default)]
pub struct DecodedBatch {
    /// Usage events in delivery order.
    pub events: Vec<UsageEvent>,
    /// Number of entries skipped because their embedded JSON was
    /// malformed or lacked required fields.
    pub entry_failures: usize,
}

/// Decodes a batch payload into its ordered usage events.
///
/// # Errors
///
/// Returns `BatchDecode` if the outer payload is not valid base64, not
/// valid gzip, or does not parse as a batch envelope. Per-entry decode
/// failures are not errors; they are counted in the returned batch.
pub fn decode_batch(payload: &str) -> Result<DecodedBatch> {
    let compressed = BASE64
        .decode(payload.trim())
        .map_err(|err| PipelineError::BatchDecode {
            reason: format!("invalid base64: {err}"),
        })?;

    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|err| PipelineError::BatchDecode {
            reason: format!("invalid gzip: {err}"),
        })?;

    let envelope: LogBatchEnvelope =
        serde_json::from_slice(&raw).map_err(|err| PipelineError::BatchDecode {
            reason: format!("invalid envelope: {err}"),
        })?;

    debug!(
        message_type = envelope.message_type.as_deref().unwrap_or("-"),
        log_group = envelope.log_group.as_deref().unwrap_or("-"),
        log_stream = envelope.log_stream.as_deref().unwrap_or("-"),
        entries = envelope.log_events.len(),
        "decoded batch envelope"
    );

    let mut batch = DecodedBatch::default();
    for (index, entry) in envelope.log_events.iter().enumerate() {
        match decode_entry(&entry.message) {
            Ok(event) => batch.events.push(event),
            Err(reason) => {
                warn!(index, %reason, "skipping malformed batch entry");
                batch.entry_failures += 1;
            }
        }
    }

    Ok(batch)
}

fn decode_entry(message: &str) -> std::result::Result<UsageEvent, String> {
    let raw: RawAuditEvent =
        serde_json::from_str(message).map_err(|err| format!("invalid entry json: {err}"))?;

    let access_key_id = AccessKeyId::new(raw.user_identity.access_key_id)
        .map_err(|err| format!("invalid access key id: {err}"))?;

    Ok(UsageEvent {
        access_key_id,
        event_time: raw.event_time,
        event_name: raw.event_name,
        event_source: raw.event_source,
        aws_region: raw.aws_region,
        user_agent: raw.user_agent,
        source_ip_address: raw.source_ip_address,
    })
}

/// Encodes an envelope the way the log router delivers it:
/// `base64(gzip(JSON))`. Used by fixtures and log-router simulators.
///
/// # Errors
///
/// Returns `BatchDecode` if serialization or compression fails.
pub fn encode_batch(envelope: &LogBatchEnvelope) -> Result<String> {
    let json = serde_json::to_vec(envelope).map_err(|err| PipelineError::BatchDecode {
        reason: format!("envelope serialization failed: {err}"),
    })?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|err| PipelineError::BatchDecode {
            reason: format!("compression failed: {err}"),
        })?;
    let compressed = encoder.finish().map_err(|err| PipelineError::BatchDecode {
        reason: format!("compression failed: {err}"),
    })?;

    Ok(BASE64.encode(compressed))
}
