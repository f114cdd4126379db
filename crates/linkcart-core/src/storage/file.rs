//! JSON file persistence
//!
//! The whole collection lives in one file as a JSON array. Writes are atomic
//! (write to temp file, fsync, rename) so the file is never left half
//! written.
//!
//! Storage location: `~/.local/share/linkcart/links.json` (configurable via
//! `Config`)

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};
use super::Backend;
use crate::models::LinkRecord;

/// File-backed store holding the serialized collection
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a saved collection exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Path the corrupted file is copied to before it can be overwritten
    pub fn backup_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".corrupt.backup");
        PathBuf::from(name)
    }

    fn set_aside_corrupt(&self, details: String) -> StorageError {
        let backup_path = self.backup_path();
        match fs::copy(&self.path, &backup_path) {
            Ok(_) => {
                warn!("Backed up unreadable links file to {:?}", backup_path);
                StorageError::CorruptDocument {
                    path: self.path.clone(),
                    backup_path,
                    details,
                }
            }
            Err(e) => {
                warn!("Could not back up unreadable links file: {}", e);
                StorageError::InvalidFormat {
                    location: self.path.display().to_string(),
                    details,
                }
            }
        }
    }
}

impl Backend for JsonFileBackend {
    fn load(&self) -> StorageResult<Option<Vec<LinkRecord>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        // Raw bytes, so invalid UTF-8 is treated as corruption rather than I/O trouble
        let content = fs::read(&self.path).map_err(|source| StorageError::ReadError {
            path: self.path.clone(),
            source,
        })?;

        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        match serde_json::from_slice::<Vec<LinkRecord>>(&content) {
            Ok(records) => {
                debug!("Loaded {} links from {:?}", records.len(), self.path);
                Ok(Some(records))
            }
            Err(e) => Err(self.set_aside_corrupt(e.to_string())),
        }
    }

    fn save(&self, records: &[LinkRecord]) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(records).map_err(StorageError::Serialize)?;
        atomic_write(&self.path, &bytes)?;
        debug!("Saved {} links to {:?}", records.len(), self.path);
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
