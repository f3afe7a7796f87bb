//! Data models for tasklist.

mod events;
mod intent;
mod task;

pub use events::{EventMeta, StoreEvent};
pub use intent::TaskIntent;
pub use task::{Task, TaskCollection, TaskId, TaskStats};
