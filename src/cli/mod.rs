//! CLI rendering helpers.
//!
//! The binary owns argument parsing and dispatch; this module turns store
//! state into the text it prints, so output can be tested without a
//! terminal.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `add` | Add a task |
//! | `list` | List tasks, newest first |
//! | `toggle` | Flip a task's completion flag |
//! | `delete` | Remove a task |
//! | `edit` | Replace a task's text |
//! | `status` | Show counts and backend details |
//! | `config` | Show the effective configuration |
//! | `completions` | Generate shell completions |

mod config;
mod list;
mod status;

pub use config::render_config;
pub use list::{OutputFormat, TaskFilter, format_timestamp, render_task_line, render_tasks};
pub use status::render_status;
