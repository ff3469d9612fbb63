//! Change event vocabulary
//!
//! The wire contract with upstream producers: typed change events tagged
//! with a closed `ChangeType` set, plus the provenance metadata recorded
//! alongside every accepted change.

mod change;

pub use change::{ChangeEvent, ChangeType, SystemMetadata, DEFAULT_RUN_ID};
