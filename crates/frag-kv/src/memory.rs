use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{KvError, KvResult};
use crate::keys::{validate_key, validate_pair};
use crate::traits::KvBackend;

type Partitions<V> = HashMap<String, HashMap<String, V>>;

/// In-memory, HashMap-based partitioned store.
///
/// Intended for tests and embedding. Partitions live behind a single
/// `RwLock`; values are cloned on read and write. Empty partitions are
/// dropped so `partition_count` reflects live owners only.
pub struct InMemoryKv<V> {
    partitions: RwLock<Partitions<V>>,
}

impl<V> InMemoryKv<V> {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
        }
    }

    fn read_map(&self) -> KvResult<RwLockReadGuard<'_, Partitions<V>>> {
        self.partitions.read().map_err(|_| KvError::LockPoisoned)
    }

    fn write_map(&self) -> KvResult<RwLockWriteGuard<'_, Partitions<V>>> {
        self.partitions.write().map_err(|_| KvError::LockPoisoned)
    }

    /// Total number of values across all partitions.
    pub fn len(&self) -> usize {
        self.read_map()
            .map(|map| map.values().map(HashMap::len).sum())
            .unwrap_or(0)
    }

    /// Returns `true` if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of non-empty partitions.
    pub fn partition_count(&self) -> usize {
        self.read_map().map(|map| map.len()).unwrap_or(0)
    }

    /// Remove everything.
    pub fn clear(&self) -> KvResult<()> {
        self.write_map()?.clear();
        Ok(())
    }
}

impl<V> Default for InMemoryKv<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> KvBackend<V> for InMemoryKv<V>
where
    V: Clone + Send + Sync,
{
    fn put(&self, partition: &str, sort: &str, value: &V) -> KvResult<()> {
        validate_pair(partition, sort)?;
        let mut map = self.write_map()?;
        map.entry(partition.to_string())
            .or_default()
            .insert(sort.to_string(), value.clone());
        Ok(())
    }

    fn get(&self, partition: &str, sort: &str) -> KvResult<Option<V>> {
        validate_pair(partition, sort)?;
        let map = self.read_map()?;
        Ok(map.get(partition).and_then(|p| p.get(sort)).cloned())
    }

    fn delete(&self, partition: &str, sort: &str) -> KvResult<bool> {
        validate_pair(partition, sort)?;
        let mut map = self.write_map()?;
        let Some(entries) = map.get_mut(partition) else {
            return Ok(false);
        };
        let removed = entries.remove(sort).is_some();
        if entries.is_empty() {
            map.remove(partition);
        }
        Ok(removed)
    }

    fn list_sort_keys(&self, partition: &str) -> KvResult<Vec<String>> {
        validate_key("partition", partition)?;
        let map = self.read_map()?;
        Ok(map
            .get(partition)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn contains(&self, partition: &str, sort: &str) -> KvResult<bool> {
        validate_pair(partition, sort)?;
        let map = self.read_map()?;
        Ok(map.get(partition).is_some_and(|p| p.contains_key(sort)))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

impl<V> std::fmt::Debug for InMemoryKv<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKv")
            .field("partitions", &self.partition_count())
            .field("values", &self.len())
            .finish()
    }
}
