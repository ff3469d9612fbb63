//! Shard-level write locks
//!
//! Changes to the same (entity, aspect) key must serialize so that the
//! validate-decide-journal-mutate sequence is atomic per key. A fixed
//! pool of mutexes keyed by key hash gives that serialization without a
//! single global writer lock.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard};

use crate::store::{AspectKey, StoreError, StoreResult};

/// Fixed pool of write locks, one per shard.
///
/// Keys map to shards by hash, so two changes for the same key always
/// contend on the same mutex. Changes for different keys usually
/// proceed in parallel.
pub struct ShardLocks {
    shards: Vec<Mutex<()>>,
}

impl ShardLocks {
    /// Creates a pool with the given shard count, clamped to at least 1.
    pub fn new(shard_count: usize) -> Self {
        let count = shard_count.max(1);
        let mut shards = Vec::with_capacity(count);
        for _ in 0..count {
            shards.push(Mutex::new(()));
        }
        ShardLocks { shards }
    }

    /// Returns the number of shards in the pool.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Acquires the write lock for the shard owning `key`.
    ///
    /// The guard must be held across the full apply sequence for the key.
    pub fn lock(&self, key: &AspectKey) -> StoreResult<MutexGuard<'_, ()>> {
        let index = self.shard_index(key);
        match self.shards[index].lock() {
            Ok(guard) => Ok(guard),
            Err(_) => Err(StoreError::LockPoisoned("shard lock")),
        }
    }

    fn shard_index(&self, key: &AspectKey) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urn::Urn;

    fn key(entity: &str, aspect: &str) -> AspectKey {
        let urn = Urn::parse(entity).unwrap();
        AspectKey::new(urn, aspect)
    }

    #[test]
    fn test_zero_shards_clamps_to_one() {
        let locks = ShardLocks::new(0);
        assert_eq!(locks.shard_count(), 1);
    }

    #[test]
    fn test_same_key_maps_to_same_shard() {
        let locks = ShardLocks::new(16);
        let a = key("urn:li:dataset:sales", "datasetProperties");
        let b = key("urn:li:dataset:sales", "datasetProperties");
        assert_eq!(locks.shard_index(&a), locks.shard_index(&b));
    }

    #[test]
    fn test_lock_and_release() {
        let locks = ShardLocks::new(4);
        let k = key("urn:li:dataset:sales", "datasetProperties");
        {
            let _guard = locks.lock(&k).unwrap();
        }
        // Released above; reacquiring must not deadlock.
        let _guard = locks.lock(&k).unwrap();
    }
}
