//! Backend factory for storage layer initialization.
//!
//! Turns a [`TasklistConfig`] into a concrete key-value backend. The task
//! store is generic over its backend, so the factory hands back a
//! [`ConfiguredBackend`] enum that delegates to whichever backend was chosen.

use crate::config::{BackendKind, TasklistConfig};
use crate::storage::{
    FilesystemKeyValueStore, KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore,
};
use crate::Result;

/// A backend selected at runtime.
#[derive(Debug)]
pub enum ConfiguredBackend {
    /// Filesystem backend.
    Filesystem(FilesystemKeyValueStore),
    /// `SQLite` backend.
    Sqlite(SqliteKeyValueStore),
    /// In-memory backend.
    Memory(MemoryKeyValueStore),
}

impl KeyValueStore for ConfiguredBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Self::Filesystem(store) => store.get(key).await,
            Self::Sqlite(store) => store.get(key).await,
            Self::Memory(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        match self {
            Self::Filesystem(store) => store.set(key, value).await,
            Self::Sqlite(store) => store.set(key, value).await,
            Self::Memory(store) => store.set(key, value).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Filesystem(store) => store.name(),
            Self::Sqlite(store) => store.name(),
            Self::Memory(store) => store.name(),
        }
    }
}

/// Factory for creating storage backends.
pub struct BackendFactory;

impl BackendFactory {
    /// Creates the backend named by `config.backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory or database cannot be created.
    pub fn create(config: &TasklistConfig) -> Result<ConfiguredBackend> {
        let backend = match config.backend {
            BackendKind::Filesystem => ConfiguredBackend::Filesystem(
                FilesystemKeyValueStore::with_create(&config.data_dir)?,
            ),
            BackendKind::Sqlite => {
                ConfiguredBackend::Sqlite(SqliteKeyValueStore::new(config.sqlite_path())?)
            },
            BackendKind::Memory => ConfiguredBackend::Memory(MemoryKeyValueStore::new()),
        };
        tracing::debug!(
            backend = backend.name(),
            data_dir = %config.data_dir.display(),
            "Created storage backend"
        );
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test_case(BackendKind::Filesystem, "filesystem")]
    #[test_case(BackendKind::Sqlite, "sqlite")]
    #[test_case(BackendKind::Memory, "memory")]
    fn test_create_each_backend(kind: BackendKind, expected: &str) {
        let dir = TempDir::new().unwrap();
        let config = TasklistConfig::default()
            .with_data_dir(dir.path())
            .with_backend(kind);

        let backend = BackendFactory::create(&config).unwrap();
        assert_eq!(backend.name(), expected);
    }

    #[tokio::test]
    async fn test_configured_backend_delegates() {
        let dir = TempDir::new().unwrap();
        let config = TasklistConfig::default()
            .with_data_dir(dir.path())
            .with_backend(BackendKind::Sqlite);
        let backend = BackendFactory::create(&config).unwrap();

        backend.set("tasks", "{}".to_string()).await.unwrap();
        assert_eq!(backend.get("tasks").await.unwrap().as_deref(), Some("{}"));
        assert!(config.sqlite_path().exists());
    }
}
