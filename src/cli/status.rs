//! Status rendering.

use crate::models::TaskStats;
use std::fmt::Write as _;

/// Renders task counts and the backend they came from.
#[must_use]
pub fn render_status(stats: TaskStats, backend: &str, storage_key: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tasklist Status");
    let _ = writeln!(out, "===============");
    let _ = writeln!(out, "Backend: {backend}");
    let _ = writeln!(out, "Storage Key: {storage_key}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Total: {}", stats.total);
    let _ = writeln!(out, "Pending: {}", stats.pending);
    let _ = write!(out, "Completed: {}", stats.completed);
    out
}
