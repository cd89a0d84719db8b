//! Forum event intake.

use axum::Json;
use axum::extract::State;

use quill_core::events::ForumEvent;
use quill_realtime::EventReport;

use crate::state::AppState;

/// POST /api/events
pub async fn publish_event(
    State(state): State<AppState>,
    Json(event): Json<ForumEvent>,
) -> Json<EventReport> {
    tracing::debug!(category = %event.category(), "Forum event received");
    Json(state.realtime.events.submit(&event).await)
}
