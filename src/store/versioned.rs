//! Versioned aspect store
//!
//! Latest-state storage for versioned aspects. One record per
//! (entity, aspect) key; version numbers start at 1 and increase strictly
//! monotonically while the key is present. DELETE returns the key to
//! absent; a later create starts again at 1.
//!
//! The store executes primitive state changes only. Which primitive a
//! given ChangeType maps to is the processor's decision; same-key calls
//! are serialized by the processor's shard locks.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::SystemMetadata;

use super::errors::{StoreError, StoreResult};
use super::key::AspectKey;

/// Stored state of one versioned aspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedRecord {
    /// Monotonic version, starting at 1.
    pub version: u64,
    /// Aspect payload.
    pub payload: Value,
    /// Provenance of the change that produced this state.
    pub metadata: SystemMetadata,
}

/// In-memory latest-state store for versioned aspects.
pub struct VersionedStore {
    records: RwLock<HashMap<AspectKey, VersionedRecord>>,
}

impl VersionedStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a snapshot of the current record for a key.
    pub fn get(&self, key: &AspectKey) -> StoreResult<Option<VersionedRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::LockPoisoned("versioned store"))?;
        Ok(records.get(key).cloned())
    }

    /// Returns the current version for a key, if present.
    pub fn current_version(&self, key: &AspectKey) -> StoreResult<Option<u64>> {
        Ok(self.get(key)?.map(|record| record.version))
    }

    /// Inserts at version 1 or replaces under the next version.
    ///
    /// Returns the stored version.
    pub fn upsert(
        &self,
        key: AspectKey,
        payload: Value,
        metadata: SystemMetadata,
    ) -> StoreResult<u64> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::LockPoisoned("versioned store"))?;

        let version = records.get(&key).map_or(1, |record| record.version + 1);
        records.insert(
            key,
            VersionedRecord {
                version,
                payload,
                metadata,
            },
        );
        Ok(version)
    }

    /// Inserts at version 1 only if the key is absent.
    ///
    /// Returns `None` when the key is already present.
    pub fn insert_new(
        &self,
        key: AspectKey,
        payload: Value,
        metadata: SystemMetadata,
    ) -> StoreResult<Option<u64>> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::LockPoisoned("versioned store"))?;

        if records.contains_key(&key) {
            return Ok(None);
        }
        records.insert(
            key,
            VersionedRecord {
                version: 1,
                payload,
                metadata,
            },
        );
        Ok(Some(1))
    }

    /// Replaces the payload under the next version number.
    ///
    /// Returns `None` when the key is absent.
    pub fn bump(
        &self,
        key: &AspectKey,
        payload: Value,
        metadata: SystemMetadata,
    ) -> StoreResult<Option<u64>> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::LockPoisoned("versioned store"))?;

        match records.get_mut(key) {
            Some(record) => {
                record.version += 1;
                record.payload = payload;
                record.metadata = metadata;
                Ok(Some(record.version))
            }
            None => Ok(None),
        }
    }

    /// Replaces the payload keeping the current version number.
    ///
    /// Returns the unchanged version, or `None` when the key is absent.
    pub fn restate(
        &self,
        key: &AspectKey,
        payload: Value,
        metadata: SystemMetadata,
    ) -> StoreResult<Option<u64>> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::LockPoisoned("versioned store"))?;

        match records.get_mut(key) {
            Some(record) => {
                record.payload = payload;
                record.metadata = metadata;
                Ok(Some(record.version))
            }
            None => Ok(None),
        }
    }

    /// Removes the record for a key.
    ///
    /// Returns whether a record was present.
    pub fn remove(&self, key: &AspectKey) -> StoreResult<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::LockPoisoned("versioned store"))?;
        Ok(records.remove(key).is_some())
    }

    /// Number of present records.
    pub fn len(&self) -> StoreResult<usize> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::LockPoisoned("versioned store"))?;
        Ok(records.len())
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for VersionedStore {
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
            "datasetProperties",
        )
    }

    fn meta() -> SystemMetadata {
        SystemMetadata::observed_at(1000)
    }

    #[test]
    fn test_upsert_version_sequence() {
        let store = VersionedStore::new();

        assert_eq!(store.upsert(key(), json!({"n": 1}), meta()).unwrap(), 1);
        assert_eq!(store.upsert(key(), json!({"n": 2}), meta()).unwrap(), 2);
        assert_eq!(store.upsert(key(), json!({"n": 3}), meta()).unwrap(), 3);

        let record = store.get(&key()).unwrap().unwrap();
        assert_eq!(record.version, 3);
        assert_eq!(record.payload, json!({"n": 3}));
    }

    #[test]
    fn test_insert_new_refuses_occupied_key() {
        let store = VersionedStore::new();

        assert_eq!(
            store.insert_new(key(), json!({}), meta()).unwrap(),
            Some(1)
        );
        assert_eq!(store.insert_new(key(), json!({}), meta()).unwrap(), None);
        assert_eq!(store.current_version(&key()).unwrap(), Some(1));
    }

    #[test]
    fn test_bump_requires_presence() {
        let store = VersionedStore::new();

        assert_eq!(store.bump(&key(), json!({}), meta()).unwrap(), None);

        store.upsert(key(), json!({"a": 1}), meta()).unwrap();
        assert_eq!(
            store.bump(&key(), json!({"a": 2}), meta()).unwrap(),
            Some(2)
        );
    }

    #[test]
    fn test_restate_keeps_version() {
        let store = VersionedStore::new();
        store.upsert(key(), json!({"n": 1}), meta()).unwrap();
        store.upsert(key(), json!({"n": 2}), meta()).unwrap();

        let restated = store
            .restate(&key(), json!({"n": 2, "restated": true}), meta())
            .unwrap();
        assert_eq!(restated, Some(2));

        let record = store.get(&key()).unwrap().unwrap();
        assert_eq!(record.version, 2);
        assert_eq!(record.payload["restated"], json!(true));
    }

    #[test]
    fn test_remove_reports_presence() {
        let store = VersionedStore::new();
        store.upsert(key(), json!({}), meta()).unwrap();

        assert!(store.remove(&key()).unwrap());
        assert!(!store.remove(&key()).unwrap());
        assert!(store.get(&key()).unwrap().is_none());
    }

    #[test]
    fn test_version_restarts_after_remove() {
        let store = VersionedStore::new();
        store.upsert(key(), json!({}), meta()).unwrap();
        store.upsert(key(), json!({}), meta()).unwrap();
        store.remove(&key()).unwrap();

        assert_eq!(store.upsert(key(), json!({}), meta()).unwrap(), 1);
    }

    #[test]
    fn test_get_returns_snapshot() {
        let store = VersionedStore::new();
        store.upsert(key(), json!({"n": 1}), meta()).unwrap();

        let snapshot = store.get(&key()).unwrap().unwrap();
        store.upsert(key(), json!({"n": 2}), meta()).unwrap();

        assert_eq!(snapshot.payload, json!({"n": 1}));
        assert_eq!(snapshot.version, 1);
    }
}
