//! URL normalization
//!
//! Turns whatever the user typed into a canonical absolute HTTP(S) URL.
//! Input without an `http://` or `https://` prefix gets `https://` prepended
//! before parsing. No network access happens here.

use thiserror::Error;
use url::Url;

/// Reasons user input could not be turned into a URL
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Please enter a URL")]
    Empty,

    #[error("Not a valid URL: '{input}' ({reason})")]
    Invalid { input: String, reason: String },
}

/// Normalize raw user text into an absolute URL
pub fn normalize_url(input: &str) -> Result<Url, NormalizeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(NormalizeError::Empty);
    }

    let candidate = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    Url::parse(&candidate).map_err(|e| NormalizeError::Invalid {
        input: trimmed.to_string(),
        reason: e.to_string(),
    })
}

/// Normalize and return the canonical string form
pub fn normalize(input: &str) -> Result<String, NormalizeError> {
    normalize_url(input).map(String::from)
}

/// Case-insensitive check for an `http://` or `https://` prefix
fn has_http_scheme(s: &str) -> bool {
    let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
