//! Search Indexing Hint Resolver subsystem
//!
//! Reads the searchable and time-series annotation hints attached to
//! field descriptors and projects instance payloads into ordered
//! index-update instructions. The instructions are the hand-off point to
//! an external indexing collaborator.
//!
//! # Design Principles
//!
//! - Pure projection, no side effects
//! - Deterministic ordering: declaration order, then array order
//! - Hints are static descriptor configuration, resolved per instance

mod ops;
mod resolver;

pub use ops::{IndexOp, TimeseriesProjection};
pub use resolver::{derive_index_ops, derive_timeseries_projection};
