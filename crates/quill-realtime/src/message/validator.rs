//! Message validation rules.

use quill_core::error::AppError;
use quill_core::result::AppResult;

/// Maximum allowed raw frame size in bytes.
pub const MAX_FRAME_SIZE: usize = 16_384;

/// Validates the size of a raw inbound frame before decoding.
pub fn validate_frame_size(raw: &str) -> AppResult<()> {
    if raw.len() > MAX_FRAME_SIZE {
        return Err(AppError::validation(format!(
            "Frame exceeds maximum size of {MAX_FRAME_SIZE} bytes"
        )));
    }
    Ok(())
}

/// Chat message text that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    /// Trim `raw` and check it is non-empty and at most `max_len` characters.
    pub fn parse(raw: &str, max_len: usize) -> AppResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("Message content cannot be empty"));
        }
        let len = trimmed.chars().count();
        if len > max_len {
            return Err(AppError::validation(format!(
                "Message content is {len} characters; the limit is {max_len}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the text.
    pub fn into_inner(self) -> String {
        self.0
    }
}
