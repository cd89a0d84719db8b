//! Chat HTTP handlers.

use axum::Json;
use axum::extract::State;
use validator::Validate;

use quill_core::error::AppError;

use crate::dto::request::PenNameCheckRequest;
use crate::dto::response::PenNameCheckResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/chat/pen-name/check
///
/// Advisory only: the name is reserved for real at connect time.
pub async fn check_pen_name(
    State(state): State<AppState>,
    Json(req): Json<PenNameCheckRequest>,
) -> Result<Json<PenNameCheckResponse>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let name = state.realtime.identity.parse(&req.pen_name)?;
    let available = state.realtime.identity.check_available(name.as_str())?;
    let message = if available {
        format!("'{name}' is available")
    } else {
        format!("'{name}' is already in use")
    };

    Ok(Json(PenNameCheckResponse { available, message }))
}
