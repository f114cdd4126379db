//! Import and export command handlers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use linkcart_core::{export_json, parse_import, Backend, ImportPolicy, Store, EXPORT_FILE_NAME};

use super::storage_error;
use crate::output::Output;

/// Export all links as JSON
///
/// `dest` may be a file, a directory (the default file name is used inside
/// it), or "-" for stdout. Defaults to the current directory.
pub fn export<B: Backend>(store: &Store<B>, dest: Option<String>, output: &Output) -> Result<()> {
    let json = export_json(store.records())?;

    if dest.as_deref() == Some("-") {
        println!("{}", json);
        return Ok(());
    }

    let path = export_path(dest.as_deref());
    std::fs::write(&path, format!("{}\n", json))
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;

    info!("Exported {} links to {:?}", store.len(), path);
    output.success(&format!(
        "Exported {} link(s) to {}",
        store.len(),
        path.display()
    ));

    Ok(())
}

/// Import links from a JSON export
///
/// Nothing is imported if any entry is invalid.
pub fn import<B: Backend>(
    store: &mut Store<B>,
    file: PathBuf,
    policy: ImportPolicy,
    output: &Output,
) -> Result<()> {
    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read import file: {}", file.display()))?;

    let records = parse_import(&text, Utc::now())?;
    let report = store.import(records, policy).map_err(storage_error)?;

    output.print_import_report(&report);
    Ok(())
}

fn export_path(dest: Option<&str>) -> PathBuf {
    match dest {
        None => PathBuf::from(EXPORT_FILE_NAME),
        Some(dest) if Path::new(dest).is_dir() => Path::new(dest).join(EXPORT_FILE_NAME),
        Some(dest) => PathBuf::from(dest),
    }
}
