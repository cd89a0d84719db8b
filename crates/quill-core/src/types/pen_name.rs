//! Pen name validation.
//!
//! A pen name is an unauthenticated, session-scoped display identity. It is
//! compared exactly (case-sensitive) after trimming surrounding whitespace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default maximum pen name length in characters.
pub const DEFAULT_MAX_PEN_NAME_LENGTH: usize = 32;

/// A validated pen name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PenName(String);

impl PenName {
    /// Validate and normalize a candidate pen name.
    pub fn parse(raw: &str, max_len: usize) -> Result<Self, AppError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(AppError::validation("Pen name is required"));
        }

        let len = trimmed.chars().count();
        if len > max_len {
            return Err(AppError::validation(format!(
                "Pen name must be at most {max_len} characters (got {len})"
            )));
        }

        if trimmed.chars().any(char::is_control) {
            return Err(AppError::validation(
                "Pen name contains control characters",
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the pen name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PenName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
