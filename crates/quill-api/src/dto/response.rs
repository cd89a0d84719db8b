//! Response DTOs.

use serde::{Deserialize, Serialize};

use quill_realtime::EngineStatus;

/// Pen name availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenNameCheckResponse {
    /// Whether no live session holds the name right now.
    pub available: bool,
    /// Human-readable explanation.
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Detailed health response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
    /// Realtime engine state.
    pub realtime: EngineStatus,
}
