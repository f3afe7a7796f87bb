//! Prometheus metrics.

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_METRICS_PORT: u16 = 9464;

/// Environment variable enabling the exporter.
pub const METRICS_ENABLED_ENV: &str = "TASKLIST_METRICS_ENABLED";
/// Environment variable overriding the exporter port.
pub const METRICS_PORT_ENV: &str = "TASKLIST_METRICS_PORT";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are exported.
    pub enabled: bool,
    /// Address to bind the metrics exporter.
    pub listen_addr: SocketAddr,
}

impl MetricsConfig {
    /// Builds metrics configuration from config settings with env overrides.
    #[must_use]
    pub fn from_settings(settings: Option<&MetricsSettings>) -> Self {
        let mut enabled = settings.and_then(|s| s.enabled).unwrap_or(false);
        let mut port = settings
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_METRICS_PORT);

        if let Some(value) = parse_bool_env(METRICS_ENABLED_ENV) {
            enabled = value;
        }
        if let Some(value) = std::env::var(METRICS_PORT_ENV)
            .ok()
            .and_then(|p| p.trim().parse().ok())
        {
            port = value;
        }

        Self {
            enabled,
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port),
        }
    }
}

fn parse_bool_env(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Installs the Prometheus exporter when enabled.
///
/// Must run inside a tokio runtime; the exporter serves its HTTP listener
/// from a runtime task. Returns whether an exporter was installed.
///
/// # Errors
///
/// Returns an error if the recorder cannot be installed.
pub fn install_prometheus(config: &MetricsConfig) -> Result<bool> {
    if !config.enabled {
        return Ok(false);
    }

    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .install()
        .map_err(|e| Error::OperationFailed {
            operation: "install_prometheus".to_string(),
            cause: e.to_string(),
        })?;

    tracing::info!(addr = %config.listen_addr, "Prometheus exporter listening");
    Ok(true)
}
