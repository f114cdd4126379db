//! Import and export of the collection as portable JSON
//!
//! Export writes every record as a pretty-printed JSON array. Import accepts
//! the same shape with every field except `url` optional, so hand-written
//! files and exports from older versions load too.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{LinkId, LinkRecord};
use crate::normalize::{normalize, NormalizeError};

/// Suggested file name for exports
pub const EXPORT_FILE_NAME: &str = "link-cart-export.json";

/// Errors from reading or writing a transfer document
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to import file: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Invalid file format: expected an array of links, found {found}")]
    NotAnArray { found: &'static str },

    #[error("Invalid link at position {index}: {details}")]
    InvalidEntry { index: usize, details: String },

    #[error("Link at position {index} has no url")]
    MissingUrl { index: usize },

    #[error("Link at position {index} has an invalid url: {source}")]
    InvalidUrl {
        index: usize,
        #[source]
        source: NormalizeError,
    },

    #[error("Failed to export links: {0}")]
    Export(#[source] serde_json::Error),
}

/// What to do with incoming records that match an existing id or URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPolicy {
    /// Keep both copies
    #[default]
    Duplicate,
    /// Drop the incoming record
    Skip,
    /// Replace the existing record with the incoming one
    Overwrite,
}

impl FromStr for ImportPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "duplicate" => Ok(ImportPolicy::Duplicate),
            "skip" => Ok(ImportPolicy::Skip),
            "overwrite" => Ok(ImportPolicy::Overwrite),
            other => Err(format!(
                "unknown import policy '{}' (expected duplicate, skip or overwrite)",
                other
            )),
        }
    }
}

impl fmt::Display for ImportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportPolicy::Duplicate => "duplicate",
            ImportPolicy::Skip => "skip",
            ImportPolicy::Overwrite => "overwrite",
        };
        f.write_str(name)
    }
}

/// Outcome of merging imported records into the collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Records added to the collection
    pub imported: usize,
    /// Incoming records dropped because they matched an existing one, or
    /// (when overwriting) were superseded by a later entry in the same file
    pub skipped: usize,
    /// Existing records replaced by incoming ones
    pub replaced: usize,
}

/// One element of an import document, every field optional
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportEntry {
    id: Option<Value>,
    url: Option<String>,
    title: Option<String>,
    tags: Option<Vec<String>>,
    favorite: Option<bool>,
    created_at: Option<DateTime<Utc>>,
}

impl ImportEntry {
    fn into_record(self, index: usize, now: DateTime<Utc>) -> Result<LinkRecord, TransferError> {
        let raw_url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or(TransferError::MissingUrl { index })?;
        let url = normalize(&raw_url).map_err(|source| TransferError::InvalidUrl { index, source })?;

        let id = match self.id {
            Some(Value::String(s)) if !s.is_empty() => LinkId::from(s),
            Some(Value::Number(n)) => LinkId::from(n.to_string()),
            _ => LinkId::generate(),
        };

        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(raw_url);

        Ok(LinkRecord {
            id,
            url,
            title,
            tags: self.tags.unwrap_or_default(),
            favorite: self.favorite.unwrap_or(false),
            created_at: self.created_at.unwrap_or(now),
        })
    }
}

/// Serialize the collection as a pretty-printed JSON array
pub fn export_json(records: &[LinkRecord]) -> Result<String, TransferError> {
    serde_json::to_string_pretty(records).map_err(TransferError::Export)
}

/// Parse an import document into records
///
/// Fails without producing anything if the text is not JSON, the top level is
/// not an array, or any element cannot become a valid record. `now` stamps
/// records that carry no `createdAt`.
pub fn parse_import(text: &str, now: DateTime<Utc>) -> Result<Vec<LinkRecord>, TransferError> {
    let value: Value = serde_json::from_str(text).map_err(TransferError::Parse)?;

    let Value::Array(items) = value else {
        return Err(TransferError::NotAnArray {
            found: json_kind(&value),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(TransferError::InvalidEntry {
                    index,
                    details: format!("expected an object, found {}", json_kind(&item)),
                });
            }
            let entry: ImportEntry =
                serde_json::from_value(item).map_err(|e| TransferError::InvalidEntry {
                    index,
                    details: e.to_string(),
                })?;
            entry.into_record(index, now)
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_minimal_entry_gets_defaults() {
        let records = parse_import(r#"[{"url":"https://x.com"}]"#, now()).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.title, "https://x.com");
        assert_eq!(record.url, "https://x.com/");
        assert!(record.tags.is_empty());
        assert!(!record.favorite);
        assert_eq!(record.created_at, now());
        assert!(!record.id.as_str().is_empty());
    }

    #[test]
    fn test_synthesized_ids_are_unique() {
        let records =
            parse_import(r#"[{"url":"https://x.com"},{"url":"https://x.com"}]"#, now()).unwrap();
        assert_ne!(records[0].id, records[1].id);
    }

    #[test]
    fn test_full_entry_preserved() {
        let text = r#"[{
            "id": "1712345678901abc",
            "url": "https://example.com/",
            "title": "Example",
            "tags": ["a", "b", "a"],
            "favorite": true,
            "createdAt": "2023-01-02T03:04:05.000Z"
        }]"#;
        let records = parse_import(text, now()).unwrap();
        let record = &records[0];

        assert_eq!(record.id.as_str(), "1712345678901abc");
        assert_eq!(record.title, "Example");
        assert_eq!(record.tags, vec!["a", "b", "a"]);
        assert!(record.favorite);
        assert_eq!(
            record.created_at,
            Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_numeric_id_kept_as_string() {
        let records = parse_import(r#"[{"id": 42, "url":"https://x.com"}]"#, now()).unwrap();
        assert_eq!(records[0].id.as_str(), "42");
    }

    #[test]
    fn test_null_fields_treated_as_missing() {
        let text = r#"[{"id":null,"url":"example.com","title":null,"tags":null,"favorite":null}]"#;
        let records = parse_import(text, now()).unwrap();
        assert_eq!(records[0].url, "https://example.com/");
        assert_eq!(records[0].title, "example.com");
        assert!(records[0].tags.is_empty());
    }

    #[test]
    fn test_non_array_rejected() {
        let err = parse_import(r#"{"foo":1}"#, now()).unwrap_err();
        assert!(matches!(err, TransferError::NotAnArray { found: "an object" }));
        assert!(err.to_string().contains("expected an array"));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = parse_import("[{\"url\": ", now()).unwrap_err();
        assert!(matches!(err, TransferError::Parse(_)));
    }

    #[test]
    fn test_bad_element_aborts_whole_import() {
        let err = parse_import(r#"[{"url":"https://ok.com"}, 5]"#, now()).unwrap_err();
        assert!(matches!(err, TransferError::InvalidEntry { index: 1, .. }));

        let err = parse_import(r#"[{"title":"no url"}]"#, now()).unwrap_err();
        assert!(matches!(err, TransferError::MissingUrl { index: 0 }));

        let err = parse_import(r#"[{"url":"bad host.com"}]"#, now()).unwrap_err();
        assert!(matches!(err, TransferError::InvalidUrl { index: 0, .. }));

        let err = parse_import(r#"[{"url":"https://x.com","tags":[1]}]"#, now()).unwrap_err();
        assert!(matches!(err, TransferError::InvalidEntry { index: 0, .. }));
    }

    #[test]
    fn test_empty_array_is_fine() {
        assert!(parse_import("[]", now()).unwrap().is_empty());
    }

    #[test]
    fn test_export_then_import_round_trips() {
        let mut first = LinkRecord::new("https://one.com/");
        first.set_title("One");
        first.tags = vec!["a".to_string(), "b".to_string()];
        first.favorite = true;
        let second = LinkRecord::new("https://two.com/path?q=1");
        let records = vec![first, second];

        let json = export_json(&records).unwrap();
        assert!(json.starts_with("[\n"));

        let imported = parse_import(&json, now()).unwrap();
        assert_eq!(imported, records);
    }

    #[test]
    fn test_policy_parse_and_display() {
        assert_eq!("skip".parse::<ImportPolicy>(), Ok(ImportPolicy::Skip));
        assert_eq!("Overwrite".parse::<ImportPolicy>(), Ok(ImportPolicy::Overwrite));
        assert!("merge".parse::<ImportPolicy>().is_err());
        assert_eq!(ImportPolicy::default().to_string(), "duplicate");
    }
}
