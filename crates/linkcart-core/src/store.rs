//! Link repository
//!
//! The `Store` owns the in-memory collection and mirrors it to a storage
//! [`Backend`] after every mutation. The in-memory collection is the source of
//! truth; the backend write is a side effect whose failure is reported to the
//! caller but does not roll the mutation back.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open(JsonFileBackend::new(config.links_path()));
//!
//! store.add(LinkRecord::new("https://example.com/"))?;
//! let hits = store.filter(&Filter::new().text("example"));
//! ```

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{LinkId, LinkPatch, LinkRecord, TagPolicy};
use crate::query::{self, Filter};
use crate::storage::{Backend, StorageResult};
use crate::transfer::{ImportPolicy, ImportReport};

/// Failure to resolve a user-supplied id or id prefix
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LookupError {
    #[error("No link found matching: {0}")]
    NotFound(String),

    #[error("Ambiguous ID '{prefix}' matches {} links. Please provide more characters.", .candidates.len())]
    Ambiguous {
        prefix: String,
        candidates: Vec<LinkId>,
    },
}

/// Repository of link records backed by a durable store
pub struct Store<B: Backend> {
    records: Vec<LinkRecord>,
    backend: B,
    tag_policy: TagPolicy,
}

impl<B: Backend> Store<B> {
    /// Load the collection from the backend
    ///
    /// A missing store gives an empty collection. An unreadable store is
    /// logged and also gives an empty collection; it is never fatal.
    pub fn open(backend: B) -> Self {
        let records = match backend.load() {
            Ok(Some(records)) => records,
            Ok(None) => {
                debug!("No saved links at {}", backend.describe());
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to load saved links, starting empty: {}", e);
                Vec::new()
            }
        };

        Self {
            records,
            backend,
            tag_policy: TagPolicy::default(),
        }
    }

    /// Set how duplicate tags are handled on add, edit and import
    pub fn with_tag_policy(mut self, tag_policy: TagPolicy) -> Self {
        self.tag_policy = tag_policy;
        self
    }

    pub fn tag_policy(&self) -> TagPolicy {
        self.tag_policy
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ==================== Queries ====================

    /// All records, newest first
    pub fn records(&self) -> &[LinkRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get a record by exact id
    pub fn get(&self, id: &LinkId) -> Option<&LinkRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    /// Resolve a full id or a unique id prefix
    pub fn find_by_prefix(&self, prefix: &str) -> Result<&LinkRecord, LookupError> {
        if let Some(exact) = self.records.iter().find(|r| r.id.as_str() == prefix) {
            return Ok(exact);
        }

        let matches: Vec<&LinkRecord> = if prefix.is_empty() {
            Vec::new()
        } else {
            self.records
                .iter()
                .filter(|r| r.id.as_str().starts_with(prefix))
                .collect()
        };

        match matches.as_slice() {
            [] => Err(LookupError::NotFound(prefix.to_string())),
            [only] => Ok(*only),
            _ => Err(LookupError::Ambiguous {
                prefix: prefix.to_string(),
                candidates: matches.iter().map(|r| r.id.clone()).collect(),
            }),
        }
    }

    /// Records passing the filter, newest first
    pub fn filter(&self, filter: &Filter) -> Vec<&LinkRecord> {
        query::filter_records(&self.records, filter)
    }

    /// Distinct tags in order of first occurrence
    pub fn tags(&self) -> Vec<String> {
        query::distinct_tags(&self.records)
    }

    /// Tags with usage counts
    pub fn tag_counts(&self) -> Vec<(String, usize)> {
        query::tag_counts(&self.records)
    }

    // ==================== Mutations ====================

    /// Prepend a record and persist
    pub fn add(&mut self, mut record: LinkRecord) -> StorageResult<()> {
        record.tags = self.tag_policy.apply(record.tags);
        debug!("Adding link {} ({})", record.id, record.url);
        self.records.insert(0, record);
        self.persist()
    }

    /// Remove a record if `confirm` accepts it
    ///
    /// Returns the removed record, or `None` if the id is unknown or the
    /// confirmation was declined. Declining is not an error and leaves the
    /// collection untouched.
    pub fn remove<F>(&mut self, id: &LinkId, confirm: F) -> StorageResult<Option<LinkRecord>>
    where
        F: FnOnce(&LinkRecord) -> bool,
    {
        let Some(pos) = self.records.iter().position(|r| &r.id == id) else {
            return Ok(None);
        };

        if !confirm(&self.records[pos]) {
            debug!("Removal of {} cancelled", id);
            return Ok(None);
        }

        let removed = self.records.remove(pos);
        self.persist()?;
        Ok(Some(removed))
    }

    /// Apply a patch to a record and persist
    ///
    /// Unknown ids are a no-op and return `None`.
    pub fn update(
        &mut self,
        id: &LinkId,
        mut patch: LinkPatch,
    ) -> StorageResult<Option<&LinkRecord>> {
        let Some(pos) = self.records.iter().position(|r| &r.id == id) else {
            return Ok(None);
        };

        patch.tags = patch.tags.map(|tags| self.tag_policy.apply(tags));
        self.records[pos].apply(patch);
        self.persist()?;
        Ok(Some(&self.records[pos]))
    }

    /// Flip the favorite flag and persist
    ///
    /// Returns the new value, or `None` for an unknown id.
    pub fn toggle_favorite(&mut self, id: &LinkId) -> StorageResult<Option<bool>> {
        let Some(record) = self.records.iter_mut().find(|r| &r.id == id) else {
            return Ok(None);
        };

        record.toggle_favorite();
        let favorite = record.favorite;
        self.persist()?;
        Ok(Some(favorite))
    }

    /// Merge imported records in front of the collection and persist
    ///
    /// Incoming records keep their document order. Matching against existing
    /// records (by id or URL) follows `policy`.
    pub fn import(
        &mut self,
        incoming: Vec<LinkRecord>,
        policy: ImportPolicy,
    ) -> StorageResult<ImportReport> {
        let mut report = ImportReport::default();
        let mut accepted: Vec<LinkRecord> = Vec::with_capacity(incoming.len());

        for mut record in incoming {
            record.tags = self.tag_policy.apply(record.tags);

            match policy {
                ImportPolicy::Duplicate => {}
                ImportPolicy::Skip => {
                    let exists = self
                        .records
                        .iter()
                        .chain(accepted.iter())
                        .any(|r| same_link(r, &record));
                    if exists {
                        report.skipped += 1;
                        continue;
                    }
                }
                ImportPolicy::Overwrite => {
                    let before = self.records.len();
                    self.records.retain(|r| !same_link(r, &record));
                    report.replaced += before - self.records.len();
                    // A later entry in the same document supersedes an earlier one
                    let pending = accepted.len();
                    accepted.retain(|r| !same_link(r, &record));
                    report.skipped += pending - accepted.len();
                }
            }

            accepted.push(record);
        }

        report.imported = accepted.len();
        if report.imported == 0 && report.replaced == 0 {
            return Ok(report);
        }

        accepted.append(&mut self.records);
        self.records = accepted;
        info!(
            "Imported {} links ({} skipped, {} replaced)",
            report.imported, report.skipped, report.replaced
        );
        self.persist()?;
        Ok(report)
    }

    /// Write the full collection to the backend
    pub fn persist(&self) -> StorageResult<()> {
        self.backend.save(&self.records)
    }
}

fn same_link(a: &LinkRecord, b: &LinkRecord) -> bool {
    a.id == b.id || a.url == b.url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{JsonFileBackend, MemoryBackend};
    use crate::transfer::{export_json, parse_import};
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(title: &str, url: &str, tags: &[&str]) -> LinkRecord {
        let mut r = LinkRecord::new(url);
        r.set_title(title);
        r.tags = tags.iter().map(|t| t.to_string()).collect();
        r
    }

    fn saved(backend: &MemoryBackend) -> Vec<LinkRecord> {
        backend.load().unwrap().unwrap_or_default()
    }

    #[test]
    fn test_open_empty_backend() {
        let store = Store::open(MemoryBackend::new());
        assert!(store.is_empty());
    }

    #[test]
    fn test_open_malformed_backend_starts_empty() {
        let store = Store::open(MemoryBackend::with_raw("not json at all"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_prepends_and_persists() {
        let backend = MemoryBackend::new();
        let mut store = Store::open(backend.clone());

        store.add(record("One", "https://one.com/", &[])).unwrap();
        store.add(record("Two", "https://two.com/", &[])).unwrap();

        let titles: Vec<_> = store.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Two", "One"]);
        assert_eq!(saved(&backend), store.records());
    }

    #[test]
    fn test_remove_requires_confirmation() {
        let backend = MemoryBackend::new();
        let mut store = Store::open(backend.clone());
        let keep = record("Keep", "https://keep.com/", &[]);
        let target = record("Target", "https://target.com/", &[]);
        let target_id = target.id.clone();
        store.add(keep).unwrap();
        store.add(target).unwrap();
        let before = store.records().to_vec();

        let removed = store.remove(&target_id, |_| false).unwrap();
        assert!(removed.is_none());
        assert_eq!(store.records(), before.as_slice());
        assert_eq!(saved(&backend), before);

        let removed = store
            .remove(&target_id, |r| {
                assert_eq!(r.title, "Target");
                true
            })
            .unwrap()
            .unwrap();
        assert_eq!(removed.id, target_id);
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].title, "Keep");
        assert_eq!(saved(&backend), store.records());
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut store = Store::open(MemoryBackend::new());
        store.add(record("One", "https://one.com/", &[])).unwrap();

        let removed = store
            .remove(&LinkId::from("missing"), |_| panic!("should not ask"))
            .unwrap();
        assert!(removed.is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_title_and_tags() {
        let backend = MemoryBackend::new();
        let mut store = Store::open(backend.clone());
        let r = record("Old", "https://one.com/", &["x"]);
        let id = r.id.clone();
        store.add(r).unwrap();

        let updated = store
            .update(
                &id,
                LinkPatch::default()
                    .title("New")
                    .tags(vec!["a".to_string(), "b".to_string()]),
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.tags, vec!["a", "b"]);
        assert_eq!(saved(&backend)[0].title, "New");

        assert!(store
            .update(&LinkId::from("missing"), LinkPatch::default().title("X"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_toggle_favorite_twice_restores() {
        let backend = MemoryBackend::new();
        let mut store = Store::open(backend.clone());
        let r = record("One", "https://one.com/", &[]);
        let id = r.id.clone();
        store.add(r).unwrap();

        assert_eq!(store.toggle_favorite(&id).unwrap(), Some(true));
        assert!(saved(&backend)[0].favorite);
        assert_eq!(store.toggle_favorite(&id).unwrap(), Some(false));
        assert!(!saved(&backend)[0].favorite);

        assert_eq!(store.toggle_favorite(&LinkId::from("nope")).unwrap(), None);
    }

    #[test]
    fn test_tag_policy_applies_on_add_update_and_import() {
        let mut store = Store::open(MemoryBackend::new());
        store.add(record("One", "https://one.com/", &["a", "a", "b"])).unwrap();
        assert_eq!(store.records()[0].tags, vec!["a", "a", "b"]);

        let mut store = Store::open(MemoryBackend::new()).with_tag_policy(TagPolicy::Dedupe);
        store.add(record("One", "https://one.com/", &["a", "a", "b"])).unwrap();
        assert_eq!(store.records()[0].tags, vec!["a", "b"]);

        let id = store.records()[0].id.clone();
        store
            .update(
                &id,
                LinkPatch::default().tags(vec!["c".to_string(), "c".to_string()]),
            )
            .unwrap();
        assert_eq!(store.records()[0].tags, vec!["c"]);

        store
            .import(
                vec![record("Two", "https://two.com/", &["x", "y", "x"])],
                ImportPolicy::Duplicate,
            )
            .unwrap();
        assert_eq!(store.records()[0].tags, vec!["x", "y"]);
    }

    #[test]
    fn test_find_by_prefix() {
        let mut store = Store::open(MemoryBackend::new());
        let mut a = record("A", "https://a.com/", &[]);
        a.id = LinkId::from("abc123");
        let mut b = record("B", "https://b.com/", &[]);
        b.id = LinkId::from("abd456");
        let mut c = record("C", "https://c.com/", &[]);
        c.id = LinkId::from("ab");
        store.add(a).unwrap();
        store.add(b).unwrap();
        store.add(c).unwrap();

        assert_eq!(store.find_by_prefix("abc").unwrap().title, "A");
        assert_eq!(store.find_by_prefix("abd456").unwrap().title, "B");
        // Exact match wins over being a prefix of others
        assert_eq!(store.find_by_prefix("ab").unwrap().title, "C");
        assert!(matches!(
            store.find_by_prefix("a"),
            Err(LookupError::Ambiguous { .. })
        ));
        assert_eq!(
            store.find_by_prefix("zz").unwrap_err(),
            LookupError::NotFound("zz".to_string())
        );
    }

    #[test]
    fn test_filter_and_tags() {
        let mut store = Store::open(MemoryBackend::new());
        store
            .add(record("Example", "https://example.com/", &["a", "b"]))
            .unwrap();
        store.add(record("Other", "https://other.com/", &["c"])).unwrap();

        assert_eq!(store.filter(&Filter::new().text("exam")).len(), 1);
        assert!(store.filter(&Filter::new().text("zzz")).is_empty());
        assert_eq!(store.tags(), vec!["c", "a", "b"]);
        assert_eq!(store.tag_counts()[0], ("c".to_string(), 1));
    }

    #[test]
    fn test_import_prepends_in_document_order() {
        let backend = MemoryBackend::new();
        let mut store = Store::open(backend.clone());
        store.add(record("Existing", "https://existing.com/", &[])).unwrap();

        let incoming = parse_import(
            r#"[{"url":"https://x.com","title":"X"},{"url":"https://y.com","title":"Y"}]"#,
            Utc::now(),
        )
        .unwrap();
        let report = store.import(incoming, ImportPolicy::Duplicate).unwrap();

        assert_eq!(report.imported, 2);
        let titles: Vec<_> = store.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["X", "Y", "Existing"]);
        assert_eq!(saved(&backend), store.records());
    }

    #[test]
    fn test_import_duplicate_keeps_both() {
        let mut store = Store::open(MemoryBackend::new());
        store.add(record("Old", "https://x.com/", &[])).unwrap();

        let incoming = vec![record("New", "https://x.com/", &[])];
        let report = store.import(incoming, ImportPolicy::Duplicate).unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_import_skip_existing() {
        let mut store = Store::open(MemoryBackend::new());
        let existing = record("Old", "https://x.com/", &[]);
        let existing_id = existing.id.clone();
        store.add(existing).unwrap();

        let mut same_id = record("Same id", "https://other.com/", &[]);
        same_id.id = existing_id;
        let incoming = vec![
            record("Same url", "https://x.com/", &[]),
            same_id,
            record("Fresh", "https://fresh.com/", &[]),
        ];
        let report = store.import(incoming, ImportPolicy::Skip).unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 2);
        let titles: Vec<_> = store.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Fresh", "Old"]);
    }

    #[test]
    fn test_import_overwrite_replaces() {
        let mut store = Store::open(MemoryBackend::new());
        store.add(record("Keep", "https://keep.com/", &[])).unwrap();
        store.add(record("Old", "https://x.com/", &[])).unwrap();

        let incoming = vec![record("New", "https://x.com/", &["t"])];
        let report = store.import(incoming, ImportPolicy::Overwrite).unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.replaced, 1);
        let titles: Vec<_> = store.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Keep"]);
    }

    #[test]
    fn test_import_overwrite_counts_superseded_entries() {
        let mut store = Store::open(MemoryBackend::new());
        store.add(record("Old", "https://x.com/", &[])).unwrap();

        let incoming = vec![
            record("First", "https://x.com/", &[]),
            record("Other", "https://y.com/", &[]),
            record("Second", "https://x.com/", &[]),
        ];
        let report = store.import(incoming, ImportPolicy::Overwrite).unwrap();

        assert_eq!(report.imported, 2);
        assert_eq!(report.replaced, 1);
        assert_eq!(report.skipped, 1);
        let titles: Vec<_> = store.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Other", "Second"]);
    }

    #[test]
    fn test_import_nothing_leaves_backend_untouched() {
        let backend = MemoryBackend::new();
        let mut store = Store::open(backend.clone());

        let report = store.import(Vec::new(), ImportPolicy::Duplicate).unwrap();
        assert_eq!(report, ImportReport::default());
        assert!(backend.raw().is_none());
    }

    #[test]
    fn test_export_import_round_trip_through_store() {
        let mut source = Store::open(MemoryBackend::new());
        let mut fav = record("Fav", "https://fav.com/", &["a", "b"]);
        fav.favorite = true;
        source.add(fav).unwrap();
        source.add(record("Plain", "https://plain.com/x", &[])).unwrap();

        let json = export_json(source.records()).unwrap();

        let mut target = Store::open(MemoryBackend::new());
        target
            .import(parse_import(&json, Utc::now()).unwrap(), ImportPolicy::Duplicate)
            .unwrap();
        assert_eq!(target.records(), source.records());
    }

    #[test]
    fn test_data_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("links.json");

        {
            let mut store = Store::open(JsonFileBackend::new(&path));
            store
                .add(record("Persistent Link", "https://persist.com/", &["keep"]))
                .unwrap();
        }

        let store = Store::open(JsonFileBackend::new(&path));
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].title, "Persistent Link");
        assert_eq!(store.records()[0].tags, vec!["keep"]);
    }

    #[test]
    fn test_corrupt_file_starts_empty_and_keeps_backup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("links.json");
        std::fs::write(&path, "[{broken").unwrap();

        let backend = JsonFileBackend::new(&path);
        let backup = backend.backup_path();
        let store = Store::open(backend);

        assert!(store.is_empty());
        assert!(backup.exists());
    }

    #[test]
    fn test_non_utf8_file_is_backed_up_before_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("links.json");
        let original = b"[{\"url\":\"https://a.com/\",\"title\":\"caf\xe9\"}]".to_vec();
        std::fs::write(&path, &original).unwrap();

        let backend = JsonFileBackend::new(&path);
        let backup = backend.backup_path();
        let mut store = Store::open(backend);
        assert!(store.is_empty());

        store.add(record("New", "https://new.com/", &[])).unwrap();

        assert_eq!(std::fs::read(&backup).unwrap(), original);
        assert_eq!(Store::open(JsonFileBackend::new(&path)).len(), 1);
    }
}
