//! Storage layer abstraction.
//!
//! The task store persists through the [`KeyValueStore`] trait. Backends:
//! - **Memory**: process-local map, with fault injection for tests
//! - **Filesystem**: one file per key, atomic replace on write
//! - **`SQLite`**: a single `kv` table

pub mod filesystem;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use filesystem::FilesystemKeyValueStore;
pub use memory::MemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;
pub use traits::KeyValueStore;

use std::sync::{Mutex, MutexGuard};

/// Acquires a mutex, recovering the inner value if it was poisoned.
///
/// A panic while holding one of these locks cannot leave the guarded map or
/// connection half-updated, so the value is still usable.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Storage mutex was poisoned, recovering");
            metrics::counter!("storage_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}
