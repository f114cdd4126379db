//! In-memory backend
//!
//! Holds the serialized collection as text, the same way a key-value store
//! would. Clones share the same slot, so a caller can keep a handle and
//! inspect what the repository wrote.

use std::sync::{Arc, Mutex};

use super::error::{StorageError, StorageResult};
use super::Backend;
use crate::models::LinkRecord;

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw saved text (which may be malformed)
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// The currently saved text, if anything was saved
    pub fn raw(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Backend for MemoryBackend {
    fn load(&self) -> StorageResult<Option<Vec<LinkRecord>>> {
        let Some(raw) = self.raw() else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::InvalidFormat {
                location: self.describe(),
                details: e.to_string(),
            })
    }

    fn save(&self, records: &[LinkRecord]) -> StorageResult<()> {
        let raw = serde_json::to_string(records).map_err(StorageError::Serialize)?;
        *self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(raw);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
