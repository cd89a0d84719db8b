//! JSON encoding for WebSocket frames.

use serde::Serialize;
use serde::de::DeserializeOwned;

use quill_core::error::AppError;
use quill_core::result::AppResult;

use super::validator::validate_frame_size;

/// Decode an inbound text frame. Malformed input is a validation error,
/// reported back to the sender rather than treated as a server fault.
pub fn decode<T: DeserializeOwned>(raw: &str) -> AppResult<T> {
    validate_frame_size(raw)?;
    serde_json::from_str(raw).map_err(|e| AppError::validation(format!("Malformed frame: {e}")))
}

/// Encode an outbound frame.
pub fn encode<T: Serialize>(frame: &T) -> AppResult<String> {
    serde_json::to_string(frame).map_err(AppError::from)
}
