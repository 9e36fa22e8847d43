use crate::storage::{sync_dir, StorageError, StorageLayout};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Outcome of a [`CheckpointStore::save`] call that did not hit an I/O error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Version written to the checkpoint file.
    Persisted(u64),
    /// Version below the current watermark; nothing written.
    Stale { watermark: u64 },
}

/// Durable single-integer watermark.
///
/// The in-memory value is the authority for dedup decisions. It only moves
/// forward, and it moves forward even when persisting fails so that a
/// notification is never appended twice within one process lifetime.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    watermark: u64,
}

impl CheckpointStore {
    /// Creates the storage root if needed and loads the persisted watermark.
    pub fn open(layout: &StorageLayout) -> Result<Self, StorageError> {
        let root = layout.root();
        fs::create_dir_all(root).map_err(|err| StorageError::io("create", root, err))?;
        let path = layout.checkpoint_path();
        let watermark = read_watermark(&path)?;
        Ok(Self { path, watermark })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest version accepted in this process (or loaded at open).
    pub fn watermark(&self) -> u64 {
        self.watermark
    }

    /// Re-reads the persisted watermark; 0 when no checkpoint exists yet.
    pub fn load(&self) -> Result<u64, StorageError> {
        read_watermark(&self.path)
    }

    /// Advances the watermark to `version` and persists it.
    pub fn save(&mut self, version: u64) -> Result<SaveOutcome, StorageError> {
        if version < self.watermark {
            return Ok(SaveOutcome::Stale {
                watermark: self.watermark,
            });
        }
        let written = write_watermark(&self.path, version);
        self.watermark = version;
        written.map(|()| SaveOutcome::Persisted(version))
    }
}

fn read_watermark(path: &Path) -> Result<u64, StorageError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(err) => return Err(StorageError::io("read", path, err)),
    };
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| StorageError::CorruptCheckpoint {
            path: path.to_path_buf(),
            contents,
        })
}

// Temp file + rename so a crash never leaves a torn checkpoint behind.
fn write_watermark(path: &Path, version: u64) -> Result<(), StorageError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|err| StorageError::io("create", dir, err))?;
    let mut temp = NamedTempFile::new_in(dir).map_err(|err| StorageError::io("create", dir, err))?;
    temp.as_file_mut()
        .write_all(version.to_string().as_bytes())
        .map_err(|err| StorageError::io("write", temp.path(), err))?;
    temp.as_file()
        .sync_all()
        .map_err(|err| StorageError::io("sync", temp.path(), err))?;
    temp.persist(path)
        .map_err(|err| StorageError::io("rename", path, err.error))?;
    sync_dir(dir)
}
