//! Data models for Link Cart
//!
//! Defines the single stored entity, `LinkRecord`, along with its identifier
//! and the patch type used by edits.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque record identifier
///
/// Freshly created records get a UUID v4; imported records keep whatever id
/// the document carried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(String);

impl LinkId {
    /// Generate a fresh, unique id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for listings (first 8 characters)
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for LinkId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LinkId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A saved link
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    /// Unique identifier
    pub id: LinkId,
    /// The normalized, absolute URL
    pub url: String,
    /// Display title (falls back to the URL)
    pub title: String,
    /// Free-text labels
    pub tags: Vec<String>,
    /// Starred by the user
    pub favorite: bool,
    /// When this record was created
    pub created_at: DateTime<Utc>,
}

impl LinkRecord {
    /// Create a new record for a URL, titled with the URL itself
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: LinkId::generate(),
            title: url.clone(),
            url,
            tags: Vec::new(),
            favorite: false,
            created_at: Utc::now(),
        }
    }

    /// Set the title; blank titles fall back to the URL
    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        let trimmed = title.trim();
        self.title = if trimmed.is_empty() {
            self.url.clone()
        } else {
            trimmed.to_string()
        };
    }

    /// Set all tags (replacing existing)
    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
    }

    pub fn toggle_favorite(&mut self) {
        self.favorite = !self.favorite;
    }

    /// Apply an edit patch; absent fields are left unchanged
    ///
    /// A blank patch title is ignored so the title never becomes empty.
    pub fn apply(&mut self, patch: LinkPatch) {
        if let Some(title) = patch.title {
            if !title.trim().is_empty() {
                self.set_title(title);
            }
        }
        if let Some(tags) = patch.tags {
            self.set_tags(tags);
        }
        if let Some(favorite) = patch.favorite {
            self.favorite = favorite;
        }
    }

    /// Tags joined with a space, as searched by the query engine
    pub fn tag_line(&self) -> String {
        self.tags.join(" ")
    }
}

/// Partial update for a record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub favorite: Option<bool>,
}

impl LinkPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.tags.is_none() && self.favorite.is_none()
    }
}

/// How duplicate tags within one record are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagPolicy {
    /// Keep tags exactly as entered, duplicates included
    #[default]
    Preserve,
    /// Drop repeated tags, keeping the first occurrence
    Dedupe,
}

impl TagPolicy {
    pub fn apply(self, tags: Vec<String>) -> Vec<String> {
        match self {
            TagPolicy::Preserve => tags,
            TagPolicy::Dedupe => {
                let mut seen = std::collections::HashSet::with_capacity(tags.len());
                tags.into_iter().filter(|t| seen.insert(t.clone())).collect()
            }
        }
    }
}

impl std::str::FromStr for TagPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preserve" => Ok(TagPolicy::Preserve),
            "dedupe" => Ok(TagPolicy::Dedupe),
            other => Err(format!(
                "unknown tag policy '{}' (expected preserve or dedupe)",
                other
            )),
        }
    }
}

impl fmt::Display for TagPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagPolicy::Preserve => f.write_str("preserve"),
            TagPolicy::Dedupe => f.write_str("dedupe"),
        }
    }
}

/// Split a comma-separated tag input into trimmed, non-empty tags
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
