//! In-memory key-value backend.
//!
//! Holds values in a process-local map. Used by tests and by the `memory`
//! backend setting, where nothing should outlive the process. Read and write
//! failures can be injected to exercise the store's error paths.

use crate::storage::acquire_lock;
use crate::storage::traits::KeyValueStore;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory key-value backend.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
    write_delay: Option<Duration>,
}

impl MemoryKeyValueStore {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend with one key already written.
    #[must_use]
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        acquire_lock(&store.values).insert(key.into(), value.into());
        store
    }

    /// Delays every write by `delay` before it lands.
    #[must_use]
    pub const fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Makes subsequent reads fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of successful writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns the raw value under `key` without going through the async API.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        acquire_lock(&self.values).get(key).cloned()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::PersistenceRead {
                key: key.to_string(),
                cause: "injected read failure".to_string(),
            });
        }
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::PersistenceWrite {
                key: key.to_string(),
                cause: "injected write failure".to_string(),
            });
        }
        acquire_lock(&self.values).insert(key.to_string(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("tasks").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryKeyValueStore::new();
        store.set("tasks", "{}".to_string()).await.unwrap();
        assert_eq!(store.get("tasks").await.unwrap().as_deref(), Some("{}"));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryKeyValueStore::with_value("tasks", "old");
        store.set("tasks", "new".to_string()).await.unwrap();
        assert_eq!(store.raw("tasks").as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryKeyValueStore::with_value("tasks", "{}");

        store.set_fail_reads(true);
        assert!(matches!(
            store.get("tasks").await,
            Err(Error::PersistenceRead { .. })
        ));

        store.set_fail_writes(true);
        assert!(matches!(
            store.set("tasks", "x".to_string()).await,
            Err(Error::PersistenceWrite { .. })
        ));
        assert_eq!(store.raw("tasks").as_deref(), Some("{}"));
        assert_eq!(store.write_count(), 0);

        store.set_fail_reads(false);
        assert_eq!(store.get("tasks").await.unwrap().as_deref(), Some("{}"));
    }
}
