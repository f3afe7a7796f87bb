//! The task store.
//!
//! Single authority over the task collection and its persisted mirror. Every
//! mutation copies the current collection, changes the copy, writes the copy
//! to the backend, and only then swaps it in. A failed write leaves the
//! in-memory collection untouched.
//!
//! Mutations are serialized through an async mutex held for the whole
//! copy-persist-swap cycle, so two concurrent operations never start from the
//! same snapshot and overwrite each other's change.

use crate::models::{EventMeta, StoreEvent, Task, TaskCollection, TaskId, TaskIntent, TaskStats};
use crate::observability::EventBus;
use crate::services::next_task_id;
use crate::storage::KeyValueStore;
use crate::{Error, Result, current_timestamp_millis};
use std::time::Instant;
use tokio::sync::{Mutex, broadcast, watch};
use tracing::instrument;

/// Key the collection is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "tasks";

const EVENT_SOURCE: &str = "task_store";

/// Owns a task collection mirrored to one key of a [`KeyValueStore`].
pub struct TaskStore<S: KeyValueStore> {
    backend: S,
    key: String,
    write_lock: Mutex<()>,
    collection: watch::Sender<TaskCollection>,
    ready: watch::Sender<bool>,
    events: EventBus,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Creates a store over `backend` using [`DEFAULT_STORAGE_KEY`].
    pub fn new(backend: S) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    /// Creates a store over `backend` using a custom storage key.
    pub fn with_key(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            write_lock: Mutex::new(()),
            collection: watch::Sender::new(TaskCollection::new()),
            ready: watch::Sender::new(false),
            events: EventBus::default(),
        }
    }

    /// Returns the backend.
    pub const fn backend(&self) -> &S {
        &self.backend
    }

    /// Returns the storage key.
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Returns a copy of the current collection.
    pub fn snapshot(&self) -> TaskCollection {
        self.collection.borrow().clone()
    }

    /// Returns the current tasks, newest first.
    pub fn ordered(&self) -> Vec<Task> {
        self.collection
            .borrow()
            .ordered()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Returns completion counts for the current collection.
    pub fn stats(&self) -> TaskStats {
        self.collection.borrow().stats()
    }

    /// Subscribes to published collections.
    ///
    /// The receiver always holds the latest collection that was loaded or
    /// successfully saved.
    pub fn subscribe(&self) -> watch::Receiver<TaskCollection> {
        self.collection.subscribe()
    }

    /// Subscribes to store events.
    pub fn events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Returns the store's event bus.
    pub const fn event_bus(&self) -> &EventBus {
        &self.events
    }

    /// Returns true once the startup load has finished.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Waits until the startup load has finished.
    pub async fn wait_ready(&self) {
        let mut receiver = self.ready.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = receiver.wait_for(|ready| *ready).await;
    }

    /// Loads the collection from the backend.
    ///
    /// A missing key loads as the empty collection. On success the loaded
    /// collection replaces the in-memory one and the store becomes ready.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceRead`] if the backend read fails and
    /// [`Error::Parse`] if the stored blob is malformed. The in-memory
    /// collection is unchanged in both cases.
    #[instrument(skip(self), fields(backend = self.backend.name(), key = %self.key))]
    pub async fn load(&self) -> Result<TaskCollection> {
        let _guard = self.write_lock.lock().await;
        let start = Instant::now();

        let blob = self
            .backend
            .get(&self.key)
            .await
            .inspect_err(|_| record_operation("load", start, "error"))?;
        let collection = TaskCollection::from_json(blob.as_deref().unwrap_or("{}"))
            .inspect_err(|_| record_operation("load", start, "error"))?;

        self.collection.send_replace(collection.clone());
        record_operation("load", start, "success");
        tracing::debug!(task_count = collection.len(), "Loaded tasks");

        self.mark_ready();
        Ok(collection)
    }

    /// Loads the collection, absorbing failures.
    ///
    /// Read and parse errors are logged and the store carries on with the
    /// collection it already had (empty at startup). The store is marked
    /// ready either way, so a presentation layer waiting on
    /// [`wait_ready`](Self::wait_ready) never hangs on a storage fault.
    pub async fn prepare(&self) -> TaskCollection {
        match self.load().await {
            Ok(collection) => collection,
            Err(e) => {
                tracing::error!(error = %e, key = %self.key, "Failed to load tasks, starting empty");
                self.mark_ready();
                self.snapshot()
            },
        }
    }

    /// Writes `collection` to the backend and swaps it in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceWrite`] if the backend write fails; the
    /// in-memory collection is unchanged.
    #[instrument(skip(self, collection), fields(backend = self.backend.name(), task_count = collection.len()))]
    pub async fn save(&self, collection: TaskCollection) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.persist("save", collection).await
    }

    /// Adds a task with the given text.
    ///
    /// The text is stored as given, empty strings included. Every call creates
    /// a task with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceWrite`] if the save fails.
    #[instrument(skip(self, text), fields(backend = self.backend.name(), text_len = text.len()))]
    pub async fn add_task(&self, text: &str) -> Result<Task> {
        let _guard = self.write_lock.lock().await;

        let id = next_task_id();
        let created_at = id
            .as_timestamp_millis()
            .unwrap_or_else(current_timestamp_millis);
        let task = Task::new(id, text, created_at);

        let mut next = self.snapshot();
        next.insert(task.clone());
        self.persist("add_task", next).await?;

        self.events.publish(StoreEvent::Added {
            meta: EventMeta::new(EVENT_SOURCE),
            task: task.clone(),
        });
        Ok(task)
    }

    /// Deletes a task by id.
    ///
    /// Deleting an absent id is not an error; the unchanged collection is
    /// still saved. Returns whether the id was present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceWrite`] if the save fails.
    #[instrument(skip(self), fields(backend = self.backend.name(), task_id = %id))]
    pub async fn delete_task(&self, id: &TaskId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut next = self.snapshot();
        let existed = next.remove(id).is_some();
        self.persist("delete_task", next).await?;

        self.events.publish(StoreEvent::Deleted {
            meta: EventMeta::new(EVENT_SOURCE),
            task_id: id.clone(),
            existed,
        });
        Ok(existed)
    }

    /// Flips the completion flag of a task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is absent (nothing is written),
    /// or [`Error::PersistenceWrite`] if the save fails.
    #[instrument(skip(self), fields(backend = self.backend.name(), task_id = %id))]
    pub async fn toggle_task(&self, id: &TaskId) -> Result<Task> {
        let _guard = self.write_lock.lock().await;

        let mut next = self.snapshot();
        let toggled = next
            .get(id)
            .map(Task::toggled)
            .ok_or_else(|| Error::NotFound(id.clone()))?;
        next.insert(toggled.clone());
        self.persist("toggle_task", next).await?;

        self.events.publish(StoreEvent::Toggled {
            meta: EventMeta::new(EVENT_SOURCE),
            task_id: id.clone(),
            completed: toggled.completed,
        });
        Ok(toggled)
    }

    /// Replaces the task stored under `task.id` with `task`.
    ///
    /// This is a full replacement, not a patch, and inserts the task if the id
    /// is not present yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceWrite`] if the save fails.
    #[instrument(skip(self, task), fields(backend = self.backend.name(), task_id = %task.id))]
    pub async fn update_task(&self, task: Task) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut next = self.snapshot();
        next.insert(task.clone());
        self.persist("update_task", next).await?;

        self.events.publish(StoreEvent::Updated {
            meta: EventMeta::new(EVENT_SOURCE),
            task,
        });
        Ok(())
    }

    /// Applies a user intent, absorbing every error.
    ///
    /// Failures are logged, and a failed save is also published as
    /// [`StoreEvent::SaveFailed`]. The caller only ever sees the resulting
    /// collection, changed or not.
    pub async fn dispatch(&self, intent: TaskIntent) -> TaskCollection {
        let operation = intent.operation();
        let result = match intent {
            TaskIntent::Add { text } => self.add_task(&text).await.map(|_| ()),
            TaskIntent::Delete { id } => self.delete_task(&id).await.map(|_| ()),
            TaskIntent::Toggle { id } => self.toggle_task(&id).await.map(|_| ()),
            TaskIntent::Update { task } => self.update_task(task).await,
        };

        if let Err(e) = result {
            self.report_failure(operation, &e);
        }
        self.snapshot()
    }

    fn report_failure(&self, operation: &'static str, error: &Error) {
        match error {
            Error::NotFound(id) => {
                tracing::warn!(operation, task_id = %id, "Ignoring intent for unknown task");
            },
            Error::PersistenceWrite { cause, .. } => {
                tracing::error!(operation, error = %error, "Save failed, change dropped");
                self.events.publish(StoreEvent::SaveFailed {
                    meta: EventMeta::new(EVENT_SOURCE),
                    operation,
                    cause: cause.clone(),
                });
            },
            _ => {
                tracing::error!(operation, error = %error, "Task operation failed");
            },
        }
    }

    /// Persists `next` and swaps it in. Callers must hold `write_lock`.
    async fn persist(&self, operation: &'static str, next: TaskCollection) -> Result<()> {
        let start = Instant::now();
        let blob = next.to_json()?;

        if let Err(e) = self.backend.set(&self.key, blob).await {
            record_operation(operation, start, "error");
            return Err(e);
        }

        self.collection.send_replace(next);
        record_operation(operation, start, "success");
        Ok(())
    }

    fn mark_ready(&self) {
        let first = self.ready.send_if_modified(|ready| {
            let changed = !*ready;
            *ready = true;
            changed
        });
        if first {
            let task_count = self.collection.borrow().len();
            tracing::info!(task_count, backend = self.backend.name(), "Task store ready");
            self.events.publish(StoreEvent::Ready {
                meta: EventMeta::new(EVENT_SOURCE),
                task_count,
            });
        }
    }
}

fn record_operation(operation: &'static str, start: Instant, status: &'static str) {
    metrics::counter!(
        "task_store_operations_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!("task_store_operation_duration_ms", "operation" => operation)
        .record(start.elapsed().as_secs_f64() * 1000.0);
}
