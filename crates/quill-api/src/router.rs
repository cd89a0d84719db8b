//! Route definitions for the Quill HTTP API.
//!
//! REST routes are mounted under `/api`, WebSocket upgrades under `/ws`.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Build the router with all routes, threading `AppState` through them.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(chat_routes())
        .merge(event_routes())
        .merge(health_routes());

    let ws_routes = Router::new()
        .route("/chat", get(handlers::ws::chat_ws))
        .route("/notifications", get(handlers::ws::notifications_ws));

    Router::new()
        .nest("/api", api_routes)
        .nest("/ws", ws_routes)
        .with_state(state)
}

/// Chat helper endpoints
fn chat_routes() -> Router<AppState> {
    Router::new().route(
        "/chat/pen-name/check",
        post(handlers::chat::check_pen_name),
    )
}

/// Forum event intake, called by the CRUD layer
fn event_routes() -> Router<AppState> {
    Router::new().route("/events", post(handlers::events::publish_event))
}

/// Health checks
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}
