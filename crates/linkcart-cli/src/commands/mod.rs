//! Command handlers

pub mod config;
pub mod link;
pub mod tag;
pub mod transfer;

use linkcart_core::StorageError;

/// Attach the recovery hint, if any, to a storage failure
pub fn storage_error(error: StorageError) -> anyhow::Error {
    match error.recovery_suggestion() {
        Some(hint) => anyhow::anyhow!("{}\n{}", error, hint),
        None => error.into(),
    }
}
