//! Query and filter engine
//!
//! Pure functions over a slice of records. Nothing here mutates the
//! collection; results keep the collection's order.

use indexmap::{IndexMap, IndexSet};

use crate::models::LinkRecord;

/// Current filter state (search box, tag selector, favorites toggle)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    /// Free-text query, matched case-insensitively
    pub text: String,
    /// Exact, case-sensitive tag match
    pub tag: Option<String>,
    /// Only starred records
    pub favorites_only: bool,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.tag = if tag.is_empty() { None } else { Some(tag) };
        self
    }

    pub fn favorites_only(mut self, favorites_only: bool) -> Self {
        self.favorites_only = favorites_only;
        self
    }

    /// Clear all criteria
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when the filter lets everything through
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tag.is_none() && !self.favorites_only
    }

    /// Whether a single record passes every criterion
    pub fn matches(&self, record: &LinkRecord) -> bool {
        if let Some(tag) = &self.tag {
            if !record.tags.iter().any(|t| t == tag) {
                return false;
            }
        }

        if self.favorites_only && !record.favorite {
            return false;
        }

        if self.text.is_empty() {
            return true;
        }

        let needle = self.text.to_lowercase();
        record.title.to_lowercase().contains(&needle)
            || record.url.to_lowercase().contains(&needle)
            || record.tag_line().to_lowercase().contains(&needle)
    }
}

/// Records passing the filter, in collection order
pub fn filter_records<'a>(records: &'a [LinkRecord], filter: &Filter) -> Vec<&'a LinkRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

/// Every tag in the collection, in order of first occurrence
pub fn distinct_tags(records: &[LinkRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.tags.iter())
        .cloned()
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Tag usage counts, in order of first occurrence
///
/// A tag repeated within one record counts once for that record.
pub fn tag_counts(records: &[LinkRecord]) -> Vec<(String, usize)> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for record in records {
        let unique: IndexSet<&String> = record.tags.iter().collect();
        for tag in unique {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    counts.into_iter().collect()
}
