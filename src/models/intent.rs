//! User intents forwarded by a presentation layer.

use super::{Task, TaskId};

/// A request to change the task collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskIntent {
    /// Add a new task with the given text.
    Add {
        /// Task text, not validated.
        text: String,
    },
    /// Delete a task by id.
    Delete {
        /// The id to remove.
        id: TaskId,
    },
    /// Flip a task's completion flag.
    Toggle {
        /// The id to toggle.
        id: TaskId,
    },
    /// Replace (or insert) a task wholesale.
    Update {
        /// The full replacement record.
        task: Task,
    },
}

impl TaskIntent {
    /// Returns the operation name used in logs and metrics.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add_task",
            Self::Delete { .. } => "delete_task",
            Self::Toggle { .. } => "toggle_task",
            Self::Update { .. } => "update_task",
        }
    }
}
