//! Store event types for presentation layers and observability.

use super::{Task, TaskId};
use crate::current_timestamp_millis;
use uuid::Uuid;

/// Shared event metadata.
#[derive(Debug, Clone)]
pub struct EventMeta {
    /// Unique identifier for this event.
    pub event_id: String,
    /// Event source component.
    pub source: &'static str,
    /// Timestamp (Unix epoch milliseconds).
    pub timestamp: u64,
}

impl EventMeta {
    /// Creates new event metadata using the current timestamp.
    #[must_use]
    pub fn new(source: &'static str) -> Self {
        Self::with_timestamp(source, current_timestamp_millis())
    }

    /// Creates new event metadata with a specified timestamp.
    #[must_use]
    pub fn with_timestamp(source: &'static str, timestamp: u64) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            source,
            timestamp,
        }
    }
}

/// Events emitted by the task store.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// The store finished its startup load and may be rendered.
    Ready {
        /// Event metadata.
        meta: EventMeta,
        /// Number of tasks loaded.
        task_count: usize,
    },
    /// A task was added.
    Added {
        /// Event metadata.
        meta: EventMeta,
        /// The new task.
        task: Task,
    },
    /// A task id was deleted.
    Deleted {
        /// Event metadata.
        meta: EventMeta,
        /// The deleted id.
        task_id: TaskId,
        /// Whether the id was present before the delete.
        existed: bool,
    },
    /// A task's completion flag was flipped.
    Toggled {
        /// Event metadata.
        meta: EventMeta,
        /// The toggled id.
        task_id: TaskId,
        /// The new completion state.
        completed: bool,
    },
    /// A task was replaced or inserted wholesale.
    Updated {
        /// Event metadata.
        meta: EventMeta,
        /// The stored task.
        task: Task,
    },
    /// A save failed and the mutation was dropped.
    SaveFailed {
        /// Event metadata.
        meta: EventMeta,
        /// The operation whose save failed.
        operation: &'static str,
        /// The underlying cause.
        cause: String,
    },
}

impl StoreEvent {
    /// Returns the event type string.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::Added { .. } => "added",
            Self::Deleted { .. } => "deleted",
            Self::Toggled { .. } => "toggled",
            Self::Updated { .. } => "updated",
            Self::SaveFailed { .. } => "save_failed",
        }
    }

    /// Returns the event metadata.
    #[must_use]
    pub const fn meta(&self) -> &EventMeta {
        match self {
            Self::Ready { meta, .. }
            | Self::Added { meta, .. }
            | Self::Deleted { meta, .. }
            | Self::Toggled { meta, .. }
            | Self::Updated { meta, .. }
            | Self::SaveFailed { meta, .. } => meta,
        }
    }

    /// Returns the event timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        self.meta().timestamp
    }
}
