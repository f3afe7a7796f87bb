//! `SQLite`-based key-value backend.
//!
//! Stores values in a single `kv` table. Blocking `rusqlite` calls run on the
//! tokio blocking pool so they never stall the async runtime.
//!
//! # Concurrency Model
//!
//! Uses an `Arc<Mutex<Connection>>` shared with the blocking tasks:
//!
//! - **WAL mode**: Allows concurrent readers with a single writer
//! - **`busy_timeout`**: Waits up to 5 seconds for locks instead of failing immediately
//! - **NORMAL synchronous**: Balances durability with performance

use crate::storage::acquire_lock;
use crate::storage::traits::KeyValueStore;
use crate::{Error, Result, current_timestamp_millis};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// `SQLite`-based key-value backend.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    conn: Arc<Mutex<Connection>>,
    db_path: Option<PathBuf>,
}

impl SqliteKeyValueStore {
    /// Opens (or creates) a database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_storage_dir".to_string(),
                cause: e.to_string(),
            })?;
        }

        let conn = Connection::open(&db_path).map_err(|e| Error::OperationFailed {
            operation: "open_sqlite".to_string(),
            cause: e.to_string(),
        })?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: Some(db_path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::OperationFailed {
            operation: "open_sqlite_in_memory".to_string(),
            cause: e.to_string(),
        })?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);

        // journal_mode returns a row, so it goes through query_row
        let _: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| Error::OperationFailed {
                operation: "configure_sqlite".to_string(),
                cause: e.to_string(),
            })?;

        conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;
             CREATE TABLE IF NOT EXISTS kv (
                 key TEXT PRIMARY KEY,
                 value TEXT NOT NULL,
                 updated_at INTEGER NOT NULL
             );",
        )
        .map_err(|e| Error::OperationFailed {
            operation: "initialize_sqlite".to_string(),
            cause: e.to_string(),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_connection<T, F>(&self, f: F) -> std::result::Result<T, String>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = acquire_lock(&conn);
            f(&guard).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| format!("blocking task failed: {e}"))?
    }
}

fn record_operation_metrics(operation: &'static str, start: Instant, status: &'static str) {
    metrics::counter!(
        "storage_operations_total",
        "backend" => "sqlite",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "backend" => "sqlite",
        "operation" => operation
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let start = Instant::now();
        let owned_key = key.to_string();
        let result = self
            .with_connection(move |conn| {
                conn.query_row(
                    "SELECT value FROM kv WHERE key = ?1",
                    params![owned_key],
                    |row| row.get::<_, String>(0),
                )
                .optional()
            })
            .await;

        record_operation_metrics("get", start, if result.is_ok() { "success" } else { "error" });
        result.map_err(|cause| Error::PersistenceRead {
            key: key.to_string(),
            cause,
        })
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let start = Instant::now();
        let owned_key = key.to_string();
        let updated_at = i64::try_from(current_timestamp_millis()).unwrap_or(i64::MAX);
        let result = self
            .with_connection(move |conn| {
                conn.execute(
                    "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![owned_key, value, updated_at],
                )
                .map(|_| ())
            })
            .await;

        record_operation_metrics("set", start, if result.is_ok() { "success" } else { "error" });
        result.map_err(|cause| Error::PersistenceWrite {
            key: key.to_string(),
            cause,
        })
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
