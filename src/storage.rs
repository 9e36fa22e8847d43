//! On-disk layout shared by the checkpoint store and the log sink.

use chrono::NaiveDate;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default storage root used when configuration does not override it.
pub const DEFAULT_STORAGE_ROOT: &str = "/data";
/// Name of the checkpoint file, placed directly under the storage root.
pub const CHECKPOINT_FILE_NAME: &str = "index";
/// Subdirectory holding the daily log files.
pub const LOG_DIR_NAME: &str = "log";
/// Extension appended to every daily log file.
pub const LOG_FILE_EXTENSION: &str = "log";

/// Checkpoint or log I/O failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{op} {} failed: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("checkpoint {} holds {contents:?}, expected a decimal version", path.display())]
    CorruptCheckpoint { path: PathBuf, contents: String },
}

impl StorageError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Resolves every persisted path from one configurable root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl Default for StorageLayout {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_ROOT)
    }
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.root.join(CHECKPOINT_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join(LOG_DIR_NAME)
    }

    /// Daily log file for `day` (`<root>/log/YYYY-MM-DD.log`).
    pub fn log_path(&self, day: NaiveDate) -> PathBuf {
        self.log_dir()
            .join(format!("{}.{}", day.format("%Y-%m-%d"), LOG_FILE_EXTENSION))
    }
}

/// Flushes directory entries (new files, renames) under `dir` to disk.
#[cfg(unix)]
pub(crate) fn sync_dir(dir: &Path) -> Result<(), StorageError> {
    std::fs::File::open(dir)
        .and_then(|handle| handle.sync_all())
        .map_err(|err| StorageError::io("sync", dir, err))
}

#[cfg(not(unix))]
pub(crate) fn sync_dir(_dir: &Path) -> Result<(), StorageError> {
    Ok(())
}
