//! Business logic services.
//!
//! - [`TaskStore`]: owns the task collection and its load/save cycle
//! - [`BackendFactory`]: builds the configured key-value backend
//! - [`next_task_id`]: clock-derived, strictly increasing task ids

mod backend_factory;
mod id;
mod task_store;

pub use backend_factory::{BackendFactory, ConfiguredBackend};
pub use id::{MonotonicIdGenerator, next_task_id};
pub use task_store::{DEFAULT_STORAGE_KEY, TaskStore};
