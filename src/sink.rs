use crate::storage::{sync_dir, StorageError, StorageLayout};
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// Destination for serialized records.
pub trait RecordSink {
    /// Durably appends one record; returns the file it landed in.
    fn append(&mut self, record: &str, at: DateTime<Utc>) -> Result<PathBuf, StorageError>;
}

/// Appends records to one JSON-lines file per UTC calendar day.
#[derive(Debug, Clone)]
pub struct DailyLogSink {
    layout: StorageLayout,
}

impl DailyLogSink {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }
}

impl RecordSink for DailyLogSink {
    fn append(&mut self, record: &str, at: DateTime<Utc>) -> Result<PathBuf, StorageError> {
        let dir = self.layout.log_dir();
        let new_dir = !dir.is_dir();
        // create_dir_all tolerates a concurrent creator winning the race.
        fs::create_dir_all(&dir).map_err(|err| StorageError::io("create", &dir, err))?;
        if new_dir {
            sync_dir(self.layout.root())?;
        }

        let path = self.layout.log_path(at.date_naive());
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|err| StorageError::io("open", &path, err))?;
        let original_len = file
            .metadata()
            .map_err(|err| StorageError::io("stat", &path, err))?
            .len();

        let mut line = String::with_capacity(record.len() + 2);
        let terminated = ends_with_newline(&mut file, original_len)
            .map_err(|err| StorageError::io("read", &path, err))?;
        if !terminated {
            // Terminate a torn tail so this record starts on its own line.
            line.push('\n');
        }
        line.push_str(record);
        line.push('\n');
        if let Err(err) = file.write_all(line.as_bytes()) {
            // Drop whatever part of the line made it out before the failure.
            let _ = file.set_len(original_len);
            return Err(StorageError::io("append", &path, err));
        }
        file.sync_data()
            .map_err(|err| StorageError::io("sync", &path, err))?;
        if original_len == 0 {
            sync_dir(&dir)?;
        }
        Ok(path)
    }
}

fn ends_with_newline(file: &mut File, len: u64) -> std::io::Result<bool> {
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
