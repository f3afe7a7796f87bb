//! Task list rendering.

use crate::models::Task;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use std::fmt::Write as _;

/// Output format for `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Aligned, human-readable rows.
    #[default]
    Table,
    /// A JSON array of tasks.
    Json,
}

/// Which tasks `list` shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    /// Every task.
    #[default]
    All,
    /// Only tasks not yet completed.
    Pending,
    /// Only completed tasks.
    Completed,
}

impl TaskFilter {
    /// Builds a filter from the `--pending` / `--completed` flags.
    ///
    /// Both flags together show everything.
    #[must_use]
    pub const fn from_flags(pending: bool, completed: bool) -> Self {
        match (pending, completed) {
            (true, false) => Self::Pending,
            (false, true) => Self::Completed,
            _ => Self::All,
        }
    }

    /// Returns true if the task passes the filter.
    #[must_use]
    pub const fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

/// Formats epoch milliseconds as a UTC date and time.
///
/// Zero (unknown creation time) renders as `-`.
#[must_use]
pub fn format_timestamp(millis: u64) -> String {
    if millis == 0 {
        return "-".to_string();
    }
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map_or_else(|| "-".to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

/// Renders one task as a table row.
#[must_use]
pub fn render_task_line(task: &Task) -> String {
    let mark = if task.completed { "[x]" } else { "[ ]" };
    format!(
        "{mark} {:<15} {:<16} {}",
        task.id.as_str(),
        format_timestamp(task.created_at),
        task.text
    )
}

/// Renders tasks in display order, applying the filter.
///
/// `tasks` must already be ordered; rendering does not reorder.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_tasks(tasks: &[Task], format: OutputFormat, filter: TaskFilter) -> Result<String> {
    let visible: Vec<&Task> = tasks.iter().filter(|t| filter.matches(t)).collect();

    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&visible)
            .map_err(|e| Error::OperationFailed {
                operation: "render_tasks".to_string(),
                cause: e.to_string(),
            }),
        OutputFormat::Table => {
            if visible.is_empty() {
                return Ok("No tasks.".to_string());
            }
            let mut out = String::new();
            for task in visible {
                let _ = writeln!(out, "{}", render_task_line(task));
            }
            Ok(out.trim_end().to_string())
        },
    }
}
