//! Backend wrapper that fails on demand, for exercising partial states.

use std::sync::atomic::{AtomicBool, Ordering};

use frag_kv::{InMemoryKv, KvBackend, KvError, KvResult};

pub struct FlakyKv<V> {
    pub inner: InMemoryKv<V>,
    fail_puts: AtomicBool,
    fail_gets: AtomicBool,
    fail_deletes: AtomicBool,
}

impl<V> FlakyKv<V> {
    pub fn new() -> Self {
        Self {
            inner: InMemoryKv::new(),
            fail_puts: AtomicBool::new(false),
            fail_gets: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, op: &str) -> KvResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable(format!("injected {op} failure")));
        }
        Ok(())
    }
}

impl<V: Clone + Send + Sync> KvBackend<V> for FlakyKv<V> {
    fn put(&self, partition: &str, sort: &str, value: &V) -> KvResult<()> {
        Self::check(&self.fail_puts, "put")?;
        self.inner.put(partition, sort, value)
    }

    fn get(&self, partition: &str, sort: &str) -> KvResult<Option<V>> {
        Self::check(&self.fail_gets, "get")?;
        self.inner.get(partition, sort)
    }

    fn delete(&self, partition: &str, sort: &str) -> KvResult<bool> {
        Self::check(&self.fail_deletes, "delete")?;
        self.inner.delete(partition, sort)
    }

    fn list_sort_keys(&self, partition: &str) -> KvResult<Vec<String>> {
        self.inner.list_sort_keys(partition)
    }

    fn contains(&self, partition: &str, sort: &str) -> KvResult<bool> {
        Self::check(&self.fail_gets, "get")?;
        self.inner.contains(partition, sort)
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}
