//! Journal reader with strict corruption detection
//!
//! Zero tolerance policy:
//! - if any corruption is detected, boot halts immediately
//! - no partial replay
//! - no skipping records
//! - no repair attempts
//!
//! Records are read strictly in sequence order; the first sequence must
//! be 1 and every following record must be contiguous.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use super::errors::{JournalError, JournalResult};
use super::record::{JournalRecord, MIN_RECORD_LEN};

/// Sequential reader over the change journal.
pub struct JournalReader {
    /// Path to the journal file.
    journal_path: PathBuf,
    /// Buffered reader for sequential reads.
    reader: BufReader<File>,
    /// Current byte offset in the file.
    current_offset: u64,
    /// Total file size.
    file_size: u64,
    /// Last successfully read sequence number.
    last_sequence: u64,
}

impl JournalReader {
    /// Opens a journal file for reading.
    pub fn open(journal_path: &Path) -> JournalResult<Self> {
        let file = File::open(journal_path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                JournalError::corruption(format!(
                    "Journal file not found: {}",
                    journal_path.display()
                ))
            } else {
                JournalError::corruption(format!(
                    "Failed to open journal file: {}: {}",
                    journal_path.display(),
                    e
                ))
            }
        })?;

        let metadata = file
            .metadata()
            .map_err(|e| JournalError::corruption(format!("Failed to read journal metadata: {}", e)))?;

        Ok(Self {
            journal_path: journal_path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            file_size: metadata.len(),
            last_sequence: 0,
        })
    }

    /// Opens the journal at `<data_dir>/journal/changes.log`.
    pub fn open_from_data_dir(data_dir: &Path) -> JournalResult<Self> {
        let journal_path = data_dir.join("journal").join("changes.log");
        Self::open(&journal_path)
    }

    /// Returns the path to the journal file.
    pub fn path(&self) -> &Path {
        &self.journal_path
    }

    /// Returns the last successfully read sequence number.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Returns whether there are more bytes to read.
    pub fn has_more(&self) -> bool {
        self.current_offset < self.file_size
    }

    /// Reads the next record.
    ///
    /// Returns `Ok(None)` on a clean end of file. Any framing, checksum,
    /// or sequence violation is `ADB_JOURNAL_CORRUPTION`.
    pub fn read_next(&mut self) -> JournalResult<Option<JournalRecord>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < MIN_RECORD_LEN as u64 {
            return Err(JournalError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Truncated journal: {} bytes remaining, minimum record size is {}",
                    remaining, MIN_RECORD_LEN
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            JournalError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record length: {}", e),
            )
        })?;
        let record_len = u32::from_le_bytes(len_buf) as u64;

        if record_len < MIN_RECORD_LEN as u64 {
            return Err(JournalError::corruption_at_offset(
                self.current_offset,
                format!("Invalid record length: {}", record_len),
            ));
        }
        if record_len > remaining {
            return Err(JournalError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Record length {} exceeds remaining file size {}",
                    record_len, remaining
                ),
            ));
        }

        let mut record_buf = vec![0u8; record_len as usize];
        record_buf[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut record_buf[4..]).map_err(|e| {
            JournalError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record body: {}", e),
            )
        })?;

        let (record, bytes_consumed) = JournalRecord::decode(&record_buf, self.current_offset)?;

        if self.last_sequence == 0 && record.sequence != 1 {
            return Err(JournalError::corruption_at_sequence(
                record.sequence,
                format!("First sequence number must be 1, got {}", record.sequence),
            ));
        }
        if self.last_sequence > 0 && record.sequence != self.last_sequence + 1 {
            return Err(JournalError::corruption_at_sequence(
                record.sequence,
                format!(
                    "Non-contiguous sequence number: expected {}, got {}",
                    self.last_sequence + 1,
                    record.sequence
                ),
            ));
        }

        self.current_offset += bytes_consumed as u64;
        self.last_sequence = record.sequence;

        Ok(Some(record))
    }

    /// Reads every record in order. Any corruption fails the whole read.
    pub fn read_all(&mut self) -> JournalResult<Vec<JournalRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }
}
