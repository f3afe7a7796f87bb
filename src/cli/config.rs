//! Configuration display.

use crate::config::TasklistConfig;
use std::fmt::Write as _;

/// Renders the effective configuration after file and env overrides.
#[must_use]
pub fn render_config(config: &TasklistConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Current Configuration");
    let _ = writeln!(out, "=====================");
    let _ = writeln!(out);
    let _ = writeln!(out, "Data Directory: {}", config.data_dir.display());
    let _ = writeln!(out, "Backend: {}", config.backend);
    let _ = writeln!(out, "Storage Key: {}", config.storage_key);
    let _ = writeln!(out);

    let _ = writeln!(out, "Logging:");
    let _ = writeln!(
        out,
        "  Format: {}",
        config.logging.format.as_deref().unwrap_or("pretty")
    );
    let _ = writeln!(
        out,
        "  Level: {}",
        config.logging.level.as_deref().unwrap_or("(default)")
    );
    let _ = writeln!(
        out,
        "  File: {}",
        config
            .logging
            .file
            .as_ref()
            .map_or_else(|| "(stderr)".to_string(), |p| p.display().to_string())
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Metrics:");
    let _ = writeln!(
        out,
        "  Enabled: {}",
        config.metrics.enabled.unwrap_or(false)
    );
    let _ = write!(
        out,
        "  Port: {}",
        config
            .metrics
            .port
            .map_or_else(|| "(default)".to_string(), |p| p.to_string())
    );
    out
}
