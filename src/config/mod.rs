//! Configuration management.

use crate::services::DEFAULT_STORAGE_KEY;
use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TASKLIST_CONFIG_PATH";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TASKLIST_DATA_DIR";
/// Environment variable overriding the backend.
pub const BACKEND_ENV: &str = "TASKLIST_BACKEND";

/// Main configuration for tasklist.
#[derive(Debug, Clone)]
pub struct TasklistConfig {
    /// Directory holding backend data.
    pub data_dir: PathBuf,
    /// Which key-value backend to use.
    pub backend: BackendKind,
    /// Key the task collection is stored under.
    pub storage_key: String,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Metrics settings.
    pub metrics: MetricsSettings,
    /// Problems found while loading that did not stop the load.
    ///
    /// Config is read before logging is set up, so callers report these
    /// once a subscriber exists.
    pub warnings: Vec<String>,
}

/// Available key-value backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// One file per key under the data directory.
    #[default]
    Filesystem,
    /// A `SQLite` database in the data directory.
    Sqlite,
    /// Process memory only; nothing is kept between runs.
    Memory,
}

impl BackendKind {
    /// Parses a backend name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown names.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "filesystem" | "fs" | "file" => Ok(Self::Filesystem),
            "sqlite" => Ok(Self::Sqlite),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(Error::InvalidInput(format!("unknown backend: {other}"))),
        }
    }

    /// Returns the canonical backend name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem",
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// Output format: "pretty" or "json".
    pub format: Option<String>,
    /// Filter directive, e.g. "info" or "tasklist=debug".
    pub level: Option<String>,
    /// Optional log file; logs go to stderr when unset.
    pub file: Option<PathBuf>,
}

/// Metrics section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsSettings {
    /// Whether to install the Prometheus exporter.
    pub enabled: Option<bool>,
    /// Port for the exporter's HTTP listener.
    pub port: Option<u16>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Backend name.
    pub backend: Option<String>,
    /// Storage key.
    pub storage_key: Option<String>,
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
    /// Metrics settings.
    pub metrics: Option<MetricsSettings>,
}

impl Default for TasklistConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: BackendKind::default(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            logging: LoggingSettings::default(),
            metrics: MetricsSettings::default(),
            warnings: Vec::new(),
        }
    }
}

impl TasklistConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid config TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;
        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir (`~/.config/tasklist/config.toml` on
    /// Linux). Returns default configuration if no readable file is found;
    /// an unreadable file is recorded in [`warnings`](Self::warnings).
    #[must_use]
    pub fn load_default() -> Self {
        directories::BaseDirs::new().map_or_else(Self::default, |base_dirs| {
            Self::load_or_default(&base_dirs.config_dir().join("tasklist").join("config.toml"))
        })
    }

    fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        Self::load_from_file(path).unwrap_or_else(|e| {
            let mut config = Self::default();
            config.warnings.push(format!(
                "Ignoring unreadable config file {}: {e}",
                path.display()
            ));
            config
        })
    }

    /// Loads configuration from an explicit path, the config-path
    /// environment variable, or the default location, in that order, then
    /// applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be loaded or an
    /// override is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = if let Some(path) = path {
            Self::load_from_file(path)?
        } else if let Some(env_path) = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
        {
            Self::load_from_file(Path::new(&env_path))?
        } else {
            Self::load_default()
        };
        config.with_env_overrides()
    }

    /// Applies `TASKLIST_DATA_DIR` and `TASKLIST_BACKEND` overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if `TASKLIST_BACKEND` names an unknown backend.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(dir) = std::env::var(DATA_DIR_ENV).ok().filter(|d| !d.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = std::env::var(BACKEND_ENV).ok().filter(|b| !b.trim().is_empty()) {
            self.backend = BackendKind::parse(&backend)?;
        }
        Ok(self)
    }

    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(backend) = file.backend {
            config.backend = BackendKind::parse(&backend)?;
        }
        if let Some(key) = file.storage_key {
            if key.trim().is_empty() {
                return Err(Error::InvalidInput("storage_key must not be empty".to_string()));
            }
            config.storage_key = key;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }
        if let Some(metrics) = file.metrics {
            config.metrics = metrics;
        }

        Ok(config)
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Path of the `SQLite` database used by the `sqlite` backend.
    #[must_use]
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("tasklist.db")
    }
}

/// Returns the platform data directory for tasklist, or `.tasklist`.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".tasklist"),
        |dirs| dirs.data_dir().join("tasklist"),
    )
}
