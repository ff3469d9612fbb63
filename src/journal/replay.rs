//! Journal replay for boot recovery
//!
//! Replays journal records sequentially from byte 0 to rebuild store
//! state. Only accepted changes are ever journaled, so a change that
//! fails to re-apply means the journal no longer matches the registry
//! or was tampered with; replay treats that as corruption and aborts.

use std::path::Path;

use crate::event::ChangeEvent;

use super::errors::{JournalError, JournalResult};
use super::reader::JournalReader;

/// Target of a journal replay.
///
/// Implementations must apply the change without journaling it again.
pub trait ApplyChange {
    /// Apply one replayed change; on rejection, return the rendered
    /// rejection as the error.
    fn apply_replayed(&self, event: &ChangeEvent) -> Result<(), String>;
}

/// Statistics from a completed replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Number of records re-applied.
    pub records_replayed: u64,
    /// Sequence number of the last record, 0 if the journal was empty.
    pub last_sequence: u64,
}

/// Replays every journaled change through `target`, in sequence order.
///
/// A missing journal file is an empty journal: first boot has nothing
/// to replay. Any corruption or re-apply failure aborts with FATAL.
pub fn replay_journal<A: ApplyChange>(
    journal_path: &Path,
    target: &A,
) -> JournalResult<ReplayStats> {
    if !journal_path.exists() {
        return Ok(ReplayStats::default());
    }

    let mut reader = JournalReader::open(journal_path)?;
    let mut stats = ReplayStats::default();

    while let Some(record) = reader.read_next()? {
        let event = record.change.to_event();
        target.apply_replayed(&event).map_err(|reason| {
            JournalError::corruption_at_sequence(
                record.sequence,
                format!("Journaled change failed to re-apply: {}", reason),
            )
        })?;

        stats.records_replayed += 1;
        stats.last_sequence = record.sequence;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::record::ChangeRecord;
    use super::super::writer::JournalWriter;
    use crate::event::SystemMetadata;
    use serde_json::json;
    use std::cell::RefCell;
    use tempfile::TempDir;

    struct RecordingTarget {
        seen: RefCell<Vec<String>>,
        reject: Option<String>,
    }

    impl RecordingTarget {
        fn new() -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
                reject: None,
            }
        }

        fn rejecting(aspect: &str) -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
                reject: Some(aspect.to_string()),
            }
        }
    }

    impl ApplyChange for RecordingTarget {
        fn apply_replayed(&self, event: &ChangeEvent) -> Result<(), String> {
            if self.reject.as_deref() == Some(event.aspect.as_str()) {
                return Err(format!("rejected aspect '{}'", event.aspect));
            }
            self.seen.borrow_mut().push(event.entity.as_str().to_string());
            Ok(())
        }
    }

    fn write_changes(temp_dir: &TempDir, names: &[&str]) -> std::path::PathBuf {
        let mut writer = JournalWriter::open(temp_dir.path()).unwrap();
        for name in names {
            let event = ChangeEvent::upsert(
                format!("urn:li:dataset:{}", name).parse().unwrap(),
                "datasetProperties",
                json!({"name": name}),
            );
            writer
                .append(ChangeRecord::from_event(
                    &event,
                    SystemMetadata::observed_at(10),
                ))
                .unwrap();
        }
        writer.path().to_path_buf()
    }

    #[test]
    fn test_missing_journal_replays_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let target = RecordingTarget::new();

        let stats = replay_journal(
            &temp_dir.path().join("journal").join("changes.log"),
            &target,
        )
        .unwrap();

        assert_eq!(stats, ReplayStats::default());
        assert!(target.seen.borrow().is_empty());
    }

    #[test]
    fn test_replay_applies_in_journal_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_changes(&temp_dir, &["a", "b", "c"]);

        let target = RecordingTarget::new();
        let stats = replay_journal(&path, &target).unwrap();

        assert_eq!(stats.records_replayed, 3);
        assert_eq!(stats.last_sequence, 3);
        assert_eq!(
            *target.seen.borrow(),
            vec![
                "urn:li:dataset:a".to_string(),
                "urn:li:dataset:b".to_string(),
                "urn:li:dataset:c".to_string(),
            ]
        );
    }

    #[test]
    fn test_rejected_replay_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_changes(&temp_dir, &["a"]);

        let target = RecordingTarget::rejecting("datasetProperties");
        let err = replay_journal(&path, &target).unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(err.code().code(), "ADB_JOURNAL_CORRUPTION");
        assert!(err.message().contains("failed to re-apply"));
    }

    #[test]
    fn test_corrupt_journal_aborts_replay() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_changes(&temp_dir, &["a", "b"]);

        {
            use std::io::{Seek, SeekFrom, Write};
            let mut file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
            file.seek(SeekFrom::Start(20)).unwrap();
            file.write_all(&[0xAA]).unwrap();
        }

        let target = RecordingTarget::new();
        assert!(replay_journal(&path, &target).is_err());
    }
}
