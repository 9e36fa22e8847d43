use crate::event_model::RecordMode;
use crate::observability::logging::LogFormat;
use crate::storage::{StorageLayout, DEFAULT_STORAGE_ROOT};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default number of notifications buffered between the source and the dispatcher.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Runtime configuration, read from a JSON document. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SinkConfig {
    /// Base directory for the checkpoint file and the `log` subdirectory.
    pub storage_root: PathBuf,
    pub record_mode: RecordMode,
    pub queue_capacity: usize,
    pub source: SourceConfig,
    pub log_format: LogFormat,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            record_mode: RecordMode::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            source: SourceConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl SinkConfig {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parses and validates a configuration document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: SinkConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("storage_root must not be empty".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be at least 1".into(),
            ));
        }
        if let SourceConfig::File { path } = &self.source {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("source path must not be empty".into()));
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.storage_root)
    }
}

/// Where the watch stream is read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    #[default]
    Stdin,
    File { path: PathBuf },
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
