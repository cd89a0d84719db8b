//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Pen name availability check.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PenNameCheckRequest {
    /// Candidate pen name.
    #[validate(length(min = 1, max = 256, message = "Pen name is required"))]
    pub pen_name: String,
}

/// Query string of the chat WebSocket upgrade.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConnectQuery {
    /// Pen name to bind the session to.
    pub pen_name: String,
}
