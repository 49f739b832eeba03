use crate::error::KvResult;

/// Partitioned key/value store.
///
/// All implementations must satisfy these invariants:
/// - `put`, `get`, `delete` and `list_sort_keys` are each atomic.
/// - Calls are safe from many threads at once, including concurrent
///   mutation of different sort keys under the same partition.
/// - A missing partition behaves like an empty one.
/// - Infrastructure failures surface as `Err`; "absent" is never an error.
pub trait KvBackend<V>: Send + Sync {
    /// Store `value` under `(partition, sort)`, replacing any previous value.
    fn put(&self, partition: &str, sort: &str, value: &V) -> KvResult<()>;

    /// Read the value under `(partition, sort)`.
    ///
    /// Returns `Ok(None)` if no value exists.
    fn get(&self, partition: &str, sort: &str) -> KvResult<Option<V>>;

    /// Delete the value under `(partition, sort)`.
    ///
    /// Returns `Ok(true)` only if a value existed and was removed.
    fn delete(&self, partition: &str, sort: &str) -> KvResult<bool>;

    /// All sort keys currently stored under `partition`, in no particular order.
    fn list_sort_keys(&self, partition: &str) -> KvResult<Vec<String>>;

    /// Check whether a value exists.
    ///
    /// Default implementation reads the value. Backends may override with a
    /// cheaper existence check.
    fn contains(&self, partition: &str, sort: &str) -> KvResult<bool> {
        Ok(self.get(partition, sort)?.is_some())
    }

    /// Short backend name for diagnostics.
    fn backend_name(&self) -> &'static str;
}
