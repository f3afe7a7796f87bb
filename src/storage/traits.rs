//! Key-value backend trait.

use crate::Result;
use std::future::Future;

/// Trait for asynchronous key-value backends.
///
/// The task store keeps its whole collection under a single key, so a backend
/// only needs whole-value reads and overwrites.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// Returns `None` if the key has never been written.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PersistenceRead`] if the backend cannot be read.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Writes `value` under `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::PersistenceWrite`] if the value cannot be stored.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>> + Send;

    /// Returns a short backend name for logs and status output.
    fn name(&self) -> &'static str;
}
