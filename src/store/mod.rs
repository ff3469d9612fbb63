//! Versioned aspect storage
//!
//! # Design Principles
//!
//! - One record per (entity, aspect); latest state only
//! - Versions strictly monotonic while present, restarting at 1 after
//!   removal
//! - The processor decides transitions; the store executes primitives
//! - Reads return snapshots, never references into the map

mod errors;
mod key;
mod versioned;

pub use errors::{StoreError, StoreResult};
pub use key::AspectKey;
pub use versioned::{VersionedRecord, VersionedStore};
