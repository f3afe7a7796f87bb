//! Task types and the task collection.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a task.
///
/// Freshly generated ids are decimal Unix-millisecond readings, but any
/// string is accepted when loading a stored collection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new task ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interprets the id as a millisecond timestamp, if it is one.
    #[must_use]
    pub fn as_timestamp_millis(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single to-do entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier.
    pub id: TaskId,
    /// User-entered text.
    pub text: String,
    /// Whether the task is done.
    pub completed: bool,
    /// Creation time (Unix epoch milliseconds).
    ///
    /// Older blobs do not carry this field; see [`TaskCollection::from_json`].
    #[serde(default)]
    pub created_at: u64,
}

impl Task {
    /// Creates a new, not yet completed task.
    #[must_use]
    pub fn new(id: TaskId, text: impl Into<String>, created_at: u64) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            created_at,
        }
    }

    /// Returns a copy of this task with `completed` flipped.
    #[must_use]
    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }
}

/// A task as read from a stored blob, before defaults are applied.
#[derive(Deserialize)]
struct StoredTask {
    id: TaskId,
    text: String,
    completed: bool,
    #[serde(default)]
    created_at: Option<u64>,
}

impl StoredTask {
    fn into_task(self) -> Task {
        let created_at = self
            .created_at
            .unwrap_or_else(|| self.id.as_timestamp_millis().unwrap_or(0));
        Task {
            id: self.id,
            text: self.text,
            completed: self.completed,
            created_at,
        }
    }
}

/// Counts over a task collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    /// All tasks.
    pub total: usize,
    /// Tasks marked completed.
    pub completed: usize,
    /// Tasks not yet completed.
    pub pending: usize,
}

/// The full set of tasks, keyed by id.
///
/// Serializes as a JSON object whose keys are task ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskCollection {
    tasks: BTreeMap<TaskId, Task>,
}

impl TaskCollection {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
        }
    }

    /// Parses a stored blob.
    ///
    /// An empty or whitespace-only blob is the empty collection. Entries whose
    /// key differs from the inner `id` are re-keyed by the inner id; an entry
    /// stored under its own id wins over a re-keyed one with the same id.
    /// Tasks written without `created_at` take it from a numeric id, while an
    /// explicit value (including 0) is kept as stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the blob is not a JSON object of tasks.
    pub fn from_json(blob: &str) -> Result<Self> {
        if blob.trim().is_empty() {
            return Ok(Self::new());
        }

        let raw: BTreeMap<String, StoredTask> =
            serde_json::from_str(blob).map_err(|e| Error::Parse(e.to_string()))?;

        let (matching, mismatched): (Vec<_>, Vec<_>) = raw
            .into_iter()
            .partition(|(key, stored)| key == stored.id.as_str());

        let mut collection: Self = matching
            .into_iter()
            .map(|(_, stored)| stored.into_task())
            .collect();

        for (key, stored) in mismatched {
            let task = stored.into_task();
            if collection.contains(&task.id) {
                tracing::warn!(key = %key, id = %task.id, "Dropping stored task whose id is already taken");
                continue;
            }
            tracing::warn!(key = %key, id = %task.id, "Stored task key does not match its id, re-keying");
            collection.insert(task);
        }
        Ok(collection)
    }

    /// Serializes the collection to its stored form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::OperationFailed {
            operation: "serialize_tasks".to_string(),
            cause: e.to_string(),
        })
    }

    /// Inserts or replaces a task, keyed by its own id.
    ///
    /// Returns the previous task stored under that id.
    pub fn insert(&mut self, task: Task) -> Option<Task> {
        self.tasks.insert(task.id.clone(), task)
    }

    /// Removes a task by id.
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        self.tasks.remove(id)
    }

    /// Gets a task by id.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Gets a mutable task by id.
    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    /// Checks whether a task exists.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    /// Returns the number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if there are no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterates over tasks in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Returns the tasks newest first.
    ///
    /// Sorted descending by `created_at`, ties broken by descending id.
    #[must_use]
    pub fn ordered(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.values().collect();
        tasks.sort_by(|a, b| (b.created_at, &b.id).cmp(&(a.created_at, &a.id)));
        tasks
    }

    /// Computes completion counts.
    #[must_use]
    pub fn stats(&self) -> TaskStats {
        let completed = self.tasks.values().filter(|t| t.completed).count();
        TaskStats {
            total: self.tasks.len(),
            completed,
            pending: self.tasks.len() - completed,
        }
    }
}

impl FromIterator<Task> for TaskCollection {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        let mut collection = Self::new();
        for task in iter {
            collection.insert(task);
        }
        collection
    }
}
