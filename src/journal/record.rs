//! Journal record framing
//!
//! Each record on disk is:
//! - Record Length (u32 LE): total record length including this field
//!   and the trailing checksum
//! - Sequence Number (u64 LE)
//! - Payload: JSON encoding of the accepted change
//! - Checksum (u32 LE): CRC32 over sequence number and payload
//!
//! The payload always stores resolved provenance, never request-time
//! defaults, so a replayed change applies identically no matter when the
//! replay runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::{ChangeEvent, ChangeType, SystemMetadata};
use crate::urn::Urn;

use super::errors::{JournalError, JournalResult};

/// Record length field plus sequence number field.
const HEADER_LEN: usize = 4 + 8;
/// Trailing CRC32 field.
const CHECKSUM_LEN: usize = 4;
/// Structural floor for a record: header, a two-byte JSON payload, checksum.
pub(super) const MIN_RECORD_LEN: usize = HEADER_LEN + 2 + CHECKSUM_LEN;

fn checksum(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// The durable form of one accepted change.
///
/// Unlike the wire-side [`ChangeEvent`], the journal form carries no
/// optional provenance: `metadata` is the resolved value the processor
/// committed to when it accepted the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Target entity.
    pub entity: Urn,
    /// Target aspect name.
    pub aspect: String,
    /// Mutation kind.
    pub change_type: ChangeType,
    /// Full payload; absent for DELETE and PATCH.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Patch diff; present only for PATCH.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Value>,
    /// Explicit bucket timestamp, when the producer supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_millis: Option<i64>,
    /// Resolved provenance.
    pub metadata: SystemMetadata,
}

impl ChangeRecord {
    /// Captures an accepted event together with its resolved provenance.
    pub fn from_event(event: &ChangeEvent, metadata: SystemMetadata) -> Self {
        Self {
            entity: event.entity.clone(),
            aspect: event.aspect.clone(),
            change_type: event.change_type,
            payload: event.payload.clone(),
            patch: event.patch.clone(),
            timestamp_millis: event.timestamp_millis,
            metadata,
        }
    }

    /// Reconstructs the event for replay. The resolved provenance rides
    /// along so re-application never re-derives observation time.
    pub fn to_event(&self) -> ChangeEvent {
        let mut event = ChangeEvent::new(
            self.entity.clone(),
            self.aspect.clone(),
            self.change_type,
            self.payload.clone(),
        );
        event.patch = self.patch.clone();
        event.timestamp_millis = self.timestamp_millis;
        event.system_metadata = Some(self.metadata.clone());
        event
    }
}

/// A framed journal record: sequence number plus the change it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalRecord {
    /// Global monotonic sequence (starts at 1, never repeats).
    pub sequence: u64,
    /// The accepted change.
    pub change: ChangeRecord,
}

impl JournalRecord {
    /// Create a new journal record.
    pub fn new(sequence: u64, change: ChangeRecord) -> Self {
        Self { sequence, change }
    }

    /// Serializes the complete record, checksum included.
    pub fn encode(&self) -> JournalResult<Vec<u8>> {
        let payload = serde_json::to_vec(&self.change).map_err(|e| {
            JournalError::append_failed(
                "Failed to encode change payload",
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;

        let record_len = (HEADER_LEN + payload.len() + CHECKSUM_LEN) as u32;

        // The CRC covers sequence + payload.
        let mut checked = Vec::with_capacity(8 + payload.len());
        checked.extend_from_slice(&self.sequence.to_le_bytes());
        checked.extend_from_slice(&payload);
        let crc = checksum(&checked);

        let mut record = Vec::with_capacity(record_len as usize);
        record.extend_from_slice(&record_len.to_le_bytes());
        record.extend_from_slice(&checked);
        record.extend_from_slice(&crc.to_le_bytes());
        Ok(record)
    }

    /// Deserializes one record from the front of `data`, verifying the
    /// checksum. `offset` is the file position of `data[0]`, used for
    /// error context only.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn decode(data: &[u8], offset: u64) -> JournalResult<(Self, usize)> {
        if data.len() < MIN_RECORD_LEN {
            return Err(JournalError::corruption_at_offset(
                offset,
                format!(
                    "Record too short: {} bytes, minimum is {}",
                    data.len(),
                    MIN_RECORD_LEN
                ),
            ));
        }

        let record_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if record_len < MIN_RECORD_LEN {
            return Err(JournalError::corruption_at_offset(
                offset,
                format!("Invalid record length: {}", record_len),
            ));
        }
        if data.len() < record_len {
            return Err(JournalError::corruption_at_offset(
                offset,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_len,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_len - CHECKSUM_LEN;
        let stored_crc = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed_crc = checksum(&data[4..checksum_offset]);
        if computed_crc != stored_crc {
            return Err(JournalError::corruption_at_offset(
                offset,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_crc, stored_crc
                ),
            ));
        }

        let sequence = u64::from_le_bytes([
            data[4], data[5], data[6], data[7], data[8], data[9], data[10], data[11],
        ]);

        let change: ChangeRecord =
            serde_json::from_slice(&data[HEADER_LEN..checksum_offset]).map_err(|e| {
                JournalError::corruption_at_offset(
                    offset,
                    format!("Invalid change payload: {}", e),
                )
            })?;

        Ok((Self { sequence, change }, record_len))
    }
}
