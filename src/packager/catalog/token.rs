//! Tracking tokens embedded in record notes.
//!
//! Every version of one logical package carries the same token, so older
//! records can be found again regardless of their display name.

use crate::packager::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static TOKEN_PATTERN: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r#"\{\s*"Guid"\s*:\s*"[^"]*"\s*\}"#));

/// `{"Guid": "..."}` fragment stored in a record's notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingToken {
    /// Tracking guid shared by all versions of a package.
    #[serde(rename = "Guid")]
    pub guid: String,
}

impl TrackingToken {
    /// Creates a token for `guid`.
    pub fn new(guid: impl Into<String>) -> Self {
        Self { guid: guid.into() }
    }

    /// Serializes the token as it is written into notes.
    pub fn to_notes(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Finds and parses the first token in free text.
    pub fn extract(notes: &str) -> Option<Self> {
        let pattern = TOKEN_PATTERN.as_ref().ok()?;
        pattern
            .find_iter(notes)
            .find_map(|m| serde_json::from_str(m.as_str()).ok())
    }

    /// Returns whether this token tracks `guid`. GUIDs compare case-insensitively.
    pub fn tracks(&self, guid: &str) -> bool {
        self.guid.eq_ignore_ascii_case(guid)
    }
}

/// Returns whether `notes` carry a token tracking `guid`.
pub fn notes_track(notes: &str, guid: &str) -> bool {
    TrackingToken::extract(notes).is_some_and(|token| token.tracks(guid))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUID: &str = "3f1c2a4e-8d2b-4f6a-9c1e-5b7d9e0a1f23";

    #[test]
    fn token_is_found_inside_free_text() {
        let notes = format!("Built by the pipeline. {{\"Guid\": \"{GUID}\"}} Do not edit.");
        let token = TrackingToken::extract(&notes).unwrap();
        assert_eq!(token.guid, GUID);
        assert!(notes_track(&notes, &GUID.to_uppercase()));
    }

    #[test]
    fn notes_without_token_match_nothing() {
        assert!(TrackingToken::extract("").is_none());
        assert!(!notes_track("{\"Id\": \"x\"}", GUID));
        assert!(!notes_track("{\"Guid\": \"other\"}", GUID));
    }

    #[test]
    fn written_token_extracts_back() {
        let notes = TrackingToken::new(GUID).to_notes().unwrap();
        assert_eq!(notes, format!("{{\"Guid\":\"{GUID}\"}}"));
        assert!(notes_track(&notes, GUID));
    }
}
