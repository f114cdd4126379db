//! Storage layer
//!
//! The repository keeps the whole collection in memory and hands it to a
//! [`Backend`] after every mutation. A backend holds exactly one value: the
//! serialized collection.
//!
//! - [`JsonFileBackend`]: a JSON array in a single file, written atomically
//! - [`MemoryBackend`]: the serialized text held in memory

pub mod error;
pub mod file;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use file::JsonFileBackend;
pub use memory::MemoryBackend;

use crate::models::LinkRecord;

/// Durable store for the full collection
pub trait Backend {
    /// Read the saved collection
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> StorageResult<Option<Vec<LinkRecord>>>;

    /// Replace the saved collection
    fn save(&self, records: &[LinkRecord]) -> StorageResult<()>;

    /// Human-readable location, used in log messages
    fn describe(&self) -> String;
}
