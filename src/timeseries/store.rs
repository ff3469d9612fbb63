//! Append-only time-series aspect store
//!
//! Entries are keyed by (entity, aspect) and bucketed by timestamp. The
//! store never overwrites: a restatement of a bucket appends a new entry
//! tagged `restated` so downstream aggregation can prefer the latest
//! arrival per bucket.
//!
//! Every append is stamped with a process-wide arrival sequence. Queries
//! sort by bucket timestamp ascending with ties broken by sequence, so
//! same-bucket entries always read back in arrival order.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::SystemMetadata;
use crate::store::{AspectKey, StoreError, StoreResult};

/// One appended time-series record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesEntry {
    /// Bucket timestamp in epoch milliseconds.
    pub bucket_millis: i64,
    /// Process-wide arrival sequence, starting at 1.
    pub sequence: u64,
    /// Whether this entry restates a previously recorded bucket.
    pub restated: bool,
    /// Aspect payload.
    pub payload: Value,
    /// Provenance of the producing change.
    pub metadata: SystemMetadata,
}

/// Half-open bucket range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_millis: i64,
    pub end_millis: i64,
}

impl TimeRange {
    /// Range covering `[start, end)`.
    pub fn new(start_millis: i64, end_millis: i64) -> Self {
        Self {
            start_millis,
            end_millis,
        }
    }

    /// Range covering every representable bucket.
    pub fn all() -> Self {
        Self {
            start_millis: i64::MIN,
            end_millis: i64::MAX,
        }
    }

    /// Whether a bucket timestamp falls inside the range.
    pub fn contains(&self, bucket_millis: i64) -> bool {
        self.start_millis <= bucket_millis && bucket_millis < self.end_millis
    }
}

/// In-memory append-only store for time-series aspects.
pub struct TimeseriesStore {
    entries: RwLock<HashMap<AspectKey, Vec<TimeseriesEntry>>>,
    next_sequence: AtomicU64,
}

impl TimeseriesStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_sequence: AtomicU64::new(1),
        }
    }

    /// Appends an entry and returns it with its assigned sequence.
    ///
    /// Never overwrites prior entries.
    pub fn append(
        &self,
        key: AspectKey,
        bucket_millis: i64,
        payload: Value,
        restated: bool,
        metadata: SystemMetadata,
    ) -> StoreResult<TimeseriesEntry> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::LockPoisoned("timeseries store"))?;

        // Sequence assignment happens under the write guard so global
        // sequence order matches append order.
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let entry = TimeseriesEntry {
            bucket_millis,
            sequence,
            restated,
            payload,
            metadata,
        };
        entries.entry(key).or_default().push(entry.clone());
        Ok(entry)
    }

    /// Entries for a key within a range, ordered by bucket timestamp
    /// ascending, ties by arrival sequence.
    ///
    /// Returns a fresh snapshot on every call.
    pub fn query(&self, key: &AspectKey, range: TimeRange) -> StoreResult<Vec<TimeseriesEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::LockPoisoned("timeseries store"))?;

        let mut matched: Vec<TimeseriesEntry> = entries
            .get(key)
            .map(|stored| {
                stored
                    .iter()
                    .filter(|entry| range.contains(entry.bucket_millis))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        matched.sort_by_key(|entry| (entry.bucket_millis, entry.sequence));
        Ok(matched)
    }

    /// One entry per distinct bucket in the range: the last-arrived
    /// (highest sequence), ordered by bucket timestamp ascending.
    ///
    /// Arrival order decides, not the restated flag and not wall-clock
    /// content of the payload.
    pub fn latest_per_bucket(
        &self,
        key: &AspectKey,
        range: TimeRange,
    ) -> StoreResult<Vec<TimeseriesEntry>> {
        let all = self.query(key, range)?;

        let mut latest: BTreeMap<i64, TimeseriesEntry> = BTreeMap::new();
        for entry in all {
            match latest.get(&entry.bucket_millis) {
                Some(existing) if existing.sequence > entry.sequence => {}
                _ => {
                    latest.insert(entry.bucket_millis, entry);
                }
            }
        }
        Ok(latest.into_values().collect())
    }

    /// Number of entries stored for a key.
    pub fn entry_count(&self, key: &AspectKey) -> StoreResult<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::LockPoisoned("timeseries store"))?;
        Ok(entries.get(key).map_or(0, Vec::len))
    }

    /// Total entries across all keys.
    pub fn total_entries(&self) -> StoreResult<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::LockPoisoned("timeseries store"))?;
        Ok(entries.values().map(Vec::len).sum())
    }
}

impl Default for TimeseriesStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key() -> AspectKey {
        AspectKey::new(
            "urn:li:dataset:sales".parse().unwrap(),
            "datasetUsageStatistics",
        )
    }

    fn meta() -> SystemMetadata {
        SystemMetadata::observed_at(0)
    }

    #[test]
    fn test_query_sorts_by_bucket_not_arrival() {
        let store = TimeseriesStore::new();
        store
            .append(key(), 10, json!({"n": 1}), false, meta())
            .unwrap();
        store
            .append(key(), 5, json!({"n": 2}), false, meta())
            .unwrap();

        let results = store.query(&key(), TimeRange::new(0, 20)).unwrap();
        let buckets: Vec<i64> = results.iter().map(|e| e.bucket_millis).collect();
        assert_eq!(buckets, vec![5, 10]);
    }

    #[test]
    fn test_same_bucket_preserves_arrival_order() {
        let store = TimeseriesStore::new();
        let first = store
            .append(key(), 7, json!({"n": 1}), false, meta())
            .unwrap();
        let second = store
            .append(key(), 7, json!({"n": 2}), true, meta())
            .unwrap();
        assert!(second.sequence > first.sequence);

        let results = store.query(&key(), TimeRange::all()).unwrap();
        assert_eq!(results[0].payload, json!({"n": 1}));
        assert_eq!(results[1].payload, json!({"n": 2}));
    }

    #[test]
    fn test_latest_per_bucket_picks_last_arrival() {
        let store = TimeseriesStore::new();
        store
            .append(key(), 7, json!({"n": 1}), false, meta())
            .unwrap();
        store
            .append(key(), 7, json!({"n": 2}), true, meta())
            .unwrap();
        store
            .append(key(), 3, json!({"n": 3}), false, meta())
            .unwrap();

        let latest = store.latest_per_bucket(&key(), TimeRange::all()).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].bucket_millis, 3);
        assert_eq!(latest[1].bucket_millis, 7);
        // Bucket 7 resolves to the later arrival, the restatement.
        assert_eq!(latest[1].payload, json!({"n": 2}));
        assert!(latest[1].restated);
    }

    #[test]
    fn test_restatement_never_deletes_prior_entries() {
        let store = TimeseriesStore::new();
        store
            .append(key(), 7, json!({"n": 1}), false, meta())
            .unwrap();
        store
            .append(key(), 7, json!({"n": 2}), true, meta())
            .unwrap();

        assert_eq!(store.entry_count(&key()).unwrap(), 2);
    }

    #[test]
    fn test_range_is_half_open() {
        let store = TimeseriesStore::new();
        for bucket in [0, 5, 10] {
            store.append(key(), bucket, json!({}), false, meta()).unwrap();
        }

        let results = store.query(&key(), TimeRange::new(0, 10)).unwrap();
        let buckets: Vec<i64> = results.iter().map(|e| e.bucket_millis).collect();
        assert_eq!(buckets, vec![0, 5]);
    }

    #[test]
    fn test_query_is_restartable() {
        let store = TimeseriesStore::new();
        store.append(key(), 1, json!({}), false, meta()).unwrap();
        store.append(key(), 2, json!({}), false, meta()).unwrap();

        let first = store.query(&key(), TimeRange::all()).unwrap();
        let second = store.query(&key(), TimeRange::all()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_sequences_are_process_wide() {
        let store = TimeseriesStore::new();
        let other = AspectKey::new(
            "urn:li:dataset:other".parse().unwrap(),
            "datasetUsageStatistics",
        );

        let a = store.append(key(), 1, json!({}), false, meta()).unwrap();
        let b = store.append(other, 1, json!({}), false, meta()).unwrap();
        assert_eq!(a.sequence, 1);
        assert_eq!(b.sequence, 2);
        assert_eq!(store.total_entries().unwrap(), 2);
    }

    #[test]
    fn test_unknown_key_queries_empty() {
        let store = TimeseriesStore::new();
        assert!(store.query(&key(), TimeRange::all()).unwrap().is_empty());
        assert!(store
            .latest_per_bucket(&key(), TimeRange::all())
            .unwrap()
            .is_empty());
        assert_eq!(store.entry_count(&key()).unwrap(), 0);
    }
}
