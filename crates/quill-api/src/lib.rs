//! # quill-api
//!
//! HTTP API layer for the Quill hub built on Axum.
//!
//! Provides the chat and notification WebSocket upgrades, the pen name
//! availability check, the forum event intake used by the CRUD layer,
//! health endpoints, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
