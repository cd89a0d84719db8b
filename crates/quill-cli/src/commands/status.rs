//! Hub status from the detailed health endpoint.

use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use quill_core::config::ClientConfig;
use quill_core::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetailedHealth {
    status: String,
    version: String,
    uptime_seconds: u64,
    realtime: Realtime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Realtime {
    chat_sessions: Vec<SessionRow>,
    notification_connections: usize,
    typing: Vec<String>,
    history_len: usize,
    metrics: serde_json::Map<String, serde_json::Value>,
}

/// Chat session display row
#[derive(Debug, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct SessionRow {
    /// Connection ID
    connection_id: String,
    /// Pen name
    pen_name: String,
    /// Connected at
    connected_at: String,
}

/// Counter display row
#[derive(Debug, Serialize, Tabled)]
struct CounterRow {
    /// Counter
    counter: String,
    /// Value
    value: String,
}

/// Execute the status command
pub async fn execute(config: &ClientConfig, format: OutputFormat) -> Result<(), AppError> {
    let health: DetailedHealth = reqwest::get(super::api_url(config, "/api/health/detailed")?)
        .await
        .map_err(super::http_error)?
        .json()
        .await
        .map_err(super::http_error)?;

    println!(
        "Quill {} is {} (up {}s)",
        health.version, health.status, health.uptime_seconds
    );
    println!(
        "  {} chat sessions, {} notification connections, {} buffered messages, typing: {}",
        health.realtime.chat_sessions.len(),
        health.realtime.notification_connections,
        health.realtime.history_len,
        if health.realtime.typing.is_empty() {
            "-".to_string()
        } else {
            health.realtime.typing.join(", ")
        }
    );

    output::print_list(&health.realtime.chat_sessions, format, "No chat sessions.");

    let counters: Vec<CounterRow> = health
        .realtime
        .metrics
        .into_iter()
        .map(|(counter, value)| CounterRow {
            counter,
            value: value.to_string(),
        })
        .collect();
    output::print_list(&counters, format, "No counters.");
    Ok(())
}
