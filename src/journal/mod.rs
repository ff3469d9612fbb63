//! Change Journal subsystem
//!
//! The journal is the authoritative durability mechanism. No acknowledged
//! change exists unless it is fully persisted in the journal.
//!
//! # Design Principles
//!
//! - Durability over throughput: fsync before acknowledgment
//! - Determinism over optimization: sequential replay, resolved provenance
//! - Explicit failure over silent recovery: halt on corruption
//! - Checksums on every record

mod errors;
mod reader;
mod record;
mod replay;
mod writer;

pub use errors::{JournalError, JournalErrorCode, JournalResult};
pub use reader::JournalReader;
pub use record::{ChangeRecord, JournalRecord};
pub use replay::{replay_journal, ApplyChange, ReplayStats};
pub use writer::JournalWriter;
