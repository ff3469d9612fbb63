//! Change Event Processor subsystem
//!
//! The single write path: every change event flows through the
//! processor, which resolves the target aspect's descriptor, decides the
//! transition for the key's current state, validates, journals, mutates
//! the store, and derives index output.
//!
//! # Design Principles
//!
//! - Validate before apply; a rejected change leaves no trace
//! - One shard lock held across the full apply sequence per key
//! - The journal records accepted changes only
//! - Replay reuses the same apply path with journaling off

mod errors;
mod locks;
#[allow(clippy::module_inception)]
mod processor;

pub use errors::{ProcessorError, ProcessorResult};
pub use locks::ShardLocks;
pub use processor::{Applied, AppliedState, ChangeProcessor};
