//! Time-Series Aspect Store subsystem
//!
//! Append-only bucketed storage for aspects marked as time series.
//!
//! # Design Principles
//!
//! - Append-only; restatements add entries, never replace them
//! - Arrival sequence gives a total order; "latest per bucket" means
//!   last arrival, not greatest timestamp
//! - Queries return fresh, finite, re-iterable snapshots
//! - Bucketing is the producer's job; the store takes buckets as given

mod bucket;
mod store;

pub use bucket::{bucket_start_millis, CalendarInterval};
pub use store::{TimeRange, TimeseriesEntry, TimeseriesStore};
