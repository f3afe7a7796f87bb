//! # Tasklist
//!
//! A persistent to-do list store.
//!
//! Tasklist keeps a single user's tasks in memory and mirrors the whole
//! collection to one key of an asynchronous key-value backend after every
//! change.
//!
//! ## Features
//!
//! - Copy, mutate, persist, then swap: the in-memory list never shows a state
//!   that was not written first
//! - Pluggable backends (in-memory, filesystem, `SQLite`)
//! - Serialized mutations, so concurrent edits cannot lose updates
//! - Newest-first ordering from an explicit creation timestamp
//! - Broadcast events and `watch` snapshots for presentation layers
//!
//! ## Example
//!
//! ```rust,ignore
//! use tasklist::{MemoryKeyValueStore, TaskStore};
//!
//! let store = TaskStore::new(MemoryKeyValueStore::new());
//! store.prepare().await;
//! let task = store.add_task("Buy milk").await?;
//! store.toggle_task(&task.id).await?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::{BackendKind, TasklistConfig};
pub use models::{StoreEvent, Task, TaskCollection, TaskId, TaskIntent, TaskStats};
pub use services::{TaskStore, next_task_id};
pub use storage::{
    FilesystemKeyValueStore, KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore,
};

/// Error type for tasklist operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `PersistenceRead` | The backend fails to read the stored blob |
/// | `PersistenceWrite` | The backend fails to write the serialized collection |
/// | `Parse` | The stored blob is not a JSON object of tasks |
/// | `NotFound` | Toggling a task id that is not in the collection |
/// | `InvalidInput` | Unsafe storage keys, oversized values, bad CLI values |
/// | `OperationFailed` | Config loading, observability setup, runtime failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The key-value backend could not be read.
    #[error("failed to read '{key}': {cause}")]
    PersistenceRead {
        /// The storage key being read.
        key: String,
        /// The underlying cause.
        cause: String,
    },

    /// The key-value backend could not be written.
    ///
    /// The in-memory collection is left unchanged when this is returned.
    #[error("failed to write '{key}': {cause}")]
    PersistenceWrite {
        /// The storage key being written.
        key: String,
        /// The underlying cause.
        cause: String,
    },

    /// The stored blob could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A task id that must exist was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Returns true for errors that come from the storage backend.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::PersistenceRead { .. } | Self::PersistenceWrite { .. }
        )
    }
}

/// Result type alias for tasklist operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in milliseconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
///
/// # Examples
///
/// ```rust
/// use tasklist::current_timestamp_millis;
///
/// assert!(current_timestamp_millis() > 0);
/// ```
#[must_use]
pub fn current_timestamp_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::OperationFailed {
            operation: "test".to_string(),
            cause: "failed".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'test' failed: failed");

        let err = Error::PersistenceWrite {
            key: "tasks".to_string(),
            cause: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "failed to write 'tasks': disk full");

        let err = Error::NotFound(TaskId::new("42"));
        assert_eq!(err.to_string(), "task not found: 42");
    }

    #[test]
    fn test_is_persistence() {
        assert!(
            Error::PersistenceRead {
                key: "k".to_string(),
                cause: "c".to_string(),
            }
            .is_persistence()
        );
        assert!(!Error::Parse("bad".to_string()).is_persistence());
        assert!(!Error::NotFound(TaskId::new("1")).is_persistence());
    }

    #[test]
    fn test_current_timestamp_millis_is_after_2020() {
        assert!(current_timestamp_millis() > 1_577_836_800_000);
    }
}
