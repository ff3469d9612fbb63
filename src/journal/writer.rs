//! Journal writer with fsync enforcement
//!
//! Every append is followed by fsync before the change is acknowledged.
//! No batching, no group commit, no async durability. A change the
//! caller saw accepted is on disk.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::errors::{JournalError, JournalResult};
use super::reader::JournalReader;
use super::record::{ChangeRecord, JournalRecord};

/// Append-only writer for the change journal.
///
/// The journal is a single file, never truncated, opened with exclusive
/// write access for the lifetime of the process.
#[derive(Debug)]
pub struct JournalWriter {
    /// Path to the journal file.
    journal_path: PathBuf,
    /// Underlying file handle.
    file: File,
    /// Next sequence number to assign (starts at 1, never reused).
    next_sequence: u64,
}

impl JournalWriter {
    /// Opens or creates the journal at `<data_dir>/journal/changes.log`,
    /// creating parent directories if needed.
    ///
    /// Reopening scans the existing file; corruption surfaces here,
    /// before any new append can land after a damaged tail.
    pub fn open(data_dir: &Path) -> JournalResult<Self> {
        let journal_dir = data_dir.join("journal");
        let journal_path = journal_dir.join("changes.log");

        if !journal_dir.exists() {
            fs::create_dir_all(&journal_dir).map_err(|e| {
                JournalError::append_failed(
                    format!(
                        "Failed to create journal directory: {}",
                        journal_dir.display()
                    ),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&journal_path)
            .map_err(|e| {
                JournalError::append_failed(
                    format!("Failed to open journal file: {}", journal_path.display()),
                    e,
                )
            })?;

        let next_sequence = Self::determine_next_sequence(&journal_path)?;

        Ok(Self {
            journal_path,
            file,
            next_sequence,
        })
    }

    /// Determines the next sequence number by scanning the existing file.
    ///
    /// Returns 1 if the journal is empty or does not exist.
    fn determine_next_sequence(journal_path: &Path) -> JournalResult<u64> {
        let metadata = match fs::metadata(journal_path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(1),
            Err(e) => {
                return Err(JournalError::append_failed(
                    "Failed to read journal metadata",
                    e,
                ))
            }
        };

        if metadata.len() == 0 {
            return Ok(1);
        }

        // The reader enforces contiguity from 1, so the last record read
        // carries the highest sequence.
        let mut reader = JournalReader::open(journal_path)?;
        while reader.read_next()?.is_some() {}

        Ok(reader.last_sequence() + 1)
    }

    /// Returns the path to the journal file.
    pub fn path(&self) -> &Path {
        &self.journal_path
    }

    /// Returns the next sequence number that will be assigned.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Returns the last assigned sequence number, or 0 if none.
    pub fn last_sequence(&self) -> u64 {
        self.next_sequence.saturating_sub(1)
    }

    /// Appends one accepted change with fsync enforcement.
    ///
    /// 1. Frame the record with the next sequence number
    /// 2. Append it to changes.log
    /// 3. fsync
    /// 4. Only then advance the sequence and acknowledge
    ///
    /// Returns the sequence number assigned to this record.
    pub fn append(&mut self, change: ChangeRecord) -> JournalResult<u64> {
        let sequence = self.next_sequence;
        let record = JournalRecord::new(sequence, change);
        let encoded = record.encode()?;

        self.file.write_all(&encoded).map_err(|e| {
            JournalError::append_failed(
                format!("Failed to write journal record at sequence {}", sequence),
                e,
            )
        })?;

        // fsync is mandatory and FATAL if it fails
        self.file.sync_all().map_err(|e| {
            JournalError::fsync_failed(
                format!("fsync failed after journal append at sequence {}", sequence),
                e,
            )
        })?;

        // Only advance after a successful fsync
        self.next_sequence += 1;

        Ok(sequence)
    }

    /// Explicitly fsync the journal file.
    pub fn fsync(&self) -> JournalResult<()> {
        self.file
            .sync_all()
            .map_err(|e| JournalError::fsync_failed("Explicit journal fsync failed", e))
    }
}
