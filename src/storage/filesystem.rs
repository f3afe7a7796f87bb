//! Filesystem-based key-value backend.
//!
//! Stores each key as one file under a base directory. Values are written
//! verbatim.
//!
//! # Security
//!
//! - **Path traversal**: keys are validated so they cannot escape the base directory
//! - **File size limits**: values over [`MAX_VALUE_SIZE`] are neither written nor read
//!
//! # Atomicity
//!
//! Writes go to a temp file in the same directory and are renamed over the
//! target, so a crash mid-write leaves the previous value intact.

use crate::storage::traits::KeyValueStore;
use crate::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Maximum size of a stored value (8 MiB).
pub const MAX_VALUE_SIZE: u64 = 8 * 1024 * 1024;

const VALUE_EXTENSION: &str = "value";

/// Filesystem-based key-value backend.
#[derive(Debug, Clone)]
pub struct FilesystemKeyValueStore {
    base_path: PathBuf,
}

impl FilesystemKeyValueStore {
    /// Creates a new filesystem backend.
    ///
    /// The directory is created lazily on the first write.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Creates a new filesystem backend, creating the directory up front.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_create(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| Error::OperationFailed {
            operation: "create_storage_dir".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self { base_path })
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the path for a key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the key contains anything other than
    /// alphanumerics, dashes and underscores.
    pub fn value_path(&self, key: &str) -> Result<PathBuf> {
        if !Self::is_safe_key(key) {
            return Err(Error::InvalidInput(format!(
                "Storage key contains invalid characters: {key}"
            )));
        }
        Ok(self.base_path.join(format!("{key}.{VALUE_EXTENSION}")))
    }

    /// Checks if a key is safe to use as a file name.
    fn is_safe_key(key: &str) -> bool {
        !key.is_empty()
            && key.len() <= 200
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.base_path
            .join(format!(".{key}.tmp.{}", std::process::id()))
    }
}

impl KeyValueStore for FilesystemKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let read_error = |cause: String| Error::PersistenceRead {
            key: key.to_string(),
            cause,
        };
        let path = self
            .value_path(key)
            .map_err(|e| read_error(e.to_string()))?;

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(read_error(e.to_string())),
        };

        if metadata.len() > MAX_VALUE_SIZE {
            return Err(read_error(format!(
                "value exceeds maximum size of {MAX_VALUE_SIZE} bytes: {}",
                path.display()
            )));
        }

        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(read_error(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let write_error = |cause: String| Error::PersistenceWrite {
            key: key.to_string(),
            cause,
        };
        let path = self
            .value_path(key)
            .map_err(|e| write_error(e.to_string()))?;

        if value.len() as u64 > MAX_VALUE_SIZE {
            return Err(write_error(format!(
                "value of {} bytes exceeds maximum size of {MAX_VALUE_SIZE} bytes",
                value.len()
            )));
        }

        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| write_error(e.to_string()))?;

        let temp_path = self.temp_path(key);
        fs::write(&temp_path, value.as_bytes())
            .await
            .map_err(|e| write_error(format!("{}: {e}", temp_path.display())))?;

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(write_error(format!(
                "rename {} to {}: {e}",
                temp_path.display(),
                path.display()
            )));
        }

        tracing::debug!(key, path = %path.display(), bytes = value.len(), "Wrote value");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_and_get() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemKeyValueStore::new(dir.path());

        store.set("tasks", "{}".to_string()).await.unwrap();
        assert_eq!(store.get("tasks").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemKeyValueStore::new(dir.path().join("missing"));

        assert_eq!(store.get("tasks").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_creates_directory_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemKeyValueStore::new(dir.path().join("nested").join("data"));

        store.set("tasks", "first".to_string()).await.unwrap();
        store.set("tasks", "second".to_string()).await.unwrap();

        assert_eq!(store.get("tasks").await.unwrap().as_deref(), Some("second"));
        let leftovers: Vec<_> = std::fs::read_dir(store.base_path())
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemKeyValueStore::new(dir.path());
        let path = store.value_path("tasks").unwrap();

        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_VALUE_SIZE + 1).unwrap();

        assert!(matches!(
            store.get("tasks").await,
            Err(Error::PersistenceRead { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_into_file_path_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = FilesystemKeyValueStore::new(&blocker);

        assert!(matches!(
            store.set("tasks", "{}".to_string()).await,
            Err(Error::PersistenceWrite { .. })
        ));
    }

    #[tokio::test]
    async fn test_unsafe_key_fails_as_persistence_error() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemKeyValueStore::new(dir.path());

        assert!(matches!(
            store.set("../escape", "{}".to_string()).await,
            Err(Error::PersistenceWrite { .. })
        ));
        assert!(matches!(
            store.get("../escape").await,
            Err(Error::PersistenceRead { .. })
        ));
    }

    #[test]
    fn test_path_traversal_protection() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemKeyValueStore::new(dir.path());

        assert!(store.value_path("../../../etc/passwd").is_err());
        assert!(store.value_path("dir/subdir").is_err());
        assert!(store.value_path("dir\\subdir").is_err());
        assert!(store.value_path("").is_err());
        assert!(store.value_path("tasks").is_ok());
        assert!(store.value_path("my-tasks_2").is_ok());
    }

    #[test]
    fn test_with_create_success() {
        let dir = TempDir::new().unwrap();
        let subdir = dir.path().join("subdir");

        let store = FilesystemKeyValueStore::with_create(&subdir);
        assert!(store.is_ok());
        assert!(subdir.exists());
    }
}
