//! Validated name newtypes
//!
//! These newtypes ensure that names are valid by construction:
//! - Non-empty
//! - Within length limits
//! - Trimmed of leading/trailing whitespace

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length for story titles
const MAX_TITLE_LENGTH: usize = 200;

// ============================================================================
// StoryTitle
// ============================================================================

/// A validated story title (non-empty, <=200 chars, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoryTitle(String);

impl StoryTitle {
    /// Create a new validated story title.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if:
    /// - The title is empty after trimming
    /// - The title exceeds 200 characters after trimming
    pub fn new(title: impl Into<String>) -> Result<Self, DomainError> {
        let title = title.into();
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Story title cannot be empty"));
        }
        if trimmed.chars().count() > MAX_TITLE_LENGTH {
            return Err(DomainError::validation(format!(
                "Story title cannot exceed {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the title as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoryTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for StoryTitle {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<StoryTitle> for String {
    fn from(title: StoryTitle) -> String {
        title.0
    }
}

// ============================================================================
// CharacterKey
// ============================================================================

/// Normalized character name used as the key of accumulated character state.
///
/// Lowercased, punctuation dropped, whitespace collapsed. "Dr. Vance",
/// "dr vance" and "  DR  VANCE!" all map to the same key. This is the only
/// place names are normalized; accumulated state stores only these keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CharacterKey(String);

impl CharacterKey {
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if nothing is left after normalizing.
    pub fn new(name: &str) -> Result<Self, DomainError> {
        let cleaned: String = name
            .chars()
            .filter_map(|c| {
                if c.is_alphanumeric() {
                    Some(c.to_lowercase().collect::<String>())
                } else if c.is_whitespace() {
                    Some(" ".to_string())
                } else {
                    None
                }
            })
            .collect();
        let normalized = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return Err(DomainError::validation(format!(
                "Character name '{}' has no usable characters",
                name
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CharacterKey {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(&s)
    }
}

impl From<CharacterKey> for String {
    fn from(key: CharacterKey) -> String {
        key.0
    }
}
