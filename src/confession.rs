// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Confession data structure.
//!
//! A [`Confession`] is the only record the board stores: an anonymous text
//! post with a store-assigned id and creation timestamp. Nothing about a
//! confession changes after creation.
//!
//! # Example
//!
//! ```
//! use confession_board::confession::{validate_content, ValidationError, MAX_CONTENT_CHARS};
//!
//! assert!(validate_content("I never returned the library book").is_ok());
//! assert_eq!(validate_content(""), Err(ValidationError::Missing));
//!
//! let too_long = "x".repeat(MAX_CONTENT_CHARS + 1);
//! assert!(matches!(validate_content(&too_long), Err(ValidationError::TooLong { .. })));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum confession length in Unicode characters.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Username stamped on every confession.
pub const ANONYMOUS: &str = "anonymous";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please provide the confession content")]
    Missing,
    #[error("Confession cannot be more than {max} characters (got {len})")]
    TooLong { len: usize, max: usize },
}

/// Check content against the length rules enforced on create.
///
/// Length is counted in `char`s, so multi-byte text is not penalised.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.is_empty() {
        return Err(ValidationError::Missing);
    }
    let len = content.chars().count();
    if len > MAX_CONTENT_CHARS {
        return Err(ValidationError::TooLong { len, max: MAX_CONTENT_CHARS });
    }
    Ok(())
}

/// Opaque store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfessionId(String);

impl ConfessionId {
    /// Fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConfessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ConfessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ConfessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confession {
    pub id: ConfessionId,
    pub content: String,
    /// Creation timestamp (epoch millis)
    pub created_at: i64,
    pub likes: u64,
    pub username: String,
}

impl Confession {
    /// Build a new record with the schema defaults (0 likes, anonymous).
    ///
    /// Validation is the store's job; this constructor does not check `content`.
    pub fn new(id: ConfessionId, content: String, created_at: i64) -> Self {
        Self {
            id,
            content,
            created_at,
            likes: 0,
            username: ANONYMOUS.to_string(),
        }
    }

    /// Content length in characters.
    #[must_use]
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Case-insensitive substring match used by feed search.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        self.content.to_lowercase().contains(&query.to_lowercase())
    }
}

/// Estimated storage footprint of one record.
#[must_use]
pub fn estimated_footprint(content_len: usize, bytes_per_char: u64, overhead_bytes: u64) -> u64 {
    (content_len as u64)
        .saturating_mul(bytes_per_char)
        .saturating_add(overhead_bytes)
}

/// Current time in epoch millis.
pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
