//! Publish a notification through the hub's event endpoint.

use clap::{Args, Subcommand};
use serde::Deserialize;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use quill_core::config::ClientConfig;
use quill_core::error::AppError;
use quill_core::events::ForumEvent;

/// Arguments for the publish command
#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Event to publish
    #[command(subcommand)]
    pub command: PublishCommand,
}

/// Publishable events
#[derive(Debug, Subcommand)]
pub enum PublishCommand {
    /// Operational message
    System {
        /// Title
        #[arg(short, long)]
        title: String,
        /// Message body
        #[arg(short, long)]
        message: String,
    },
    /// Delivery check, only seen by clients subscribed to `test`
    Test {
        /// Optional message
        #[arg(short, long)]
        message: Option<String>,
    },
}

/// Delivery report row
#[derive(Debug, Serialize, Deserialize, Tabled)]
struct ReportRow {
    /// Delivered
    delivered: usize,
    /// Filtered
    filtered: usize,
    /// Dropped
    dropped: usize,
    /// Coalesced
    coalesced: bool,
}

/// Execute the publish command
pub async fn execute(
    args: &PublishArgs,
    config: &ClientConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let event = match &args.command {
        PublishCommand::System { title, message } => ForumEvent::System {
            title: title.clone(),
            message: message.clone(),
        },
        PublishCommand::Test { message } => ForumEvent::Test {
            message: message.clone(),
        },
    };

    let response = reqwest::Client::new()
        .post(super::api_url(config, "/api/events")?)
        .json(&event)
        .send()
        .await
        .map_err(super::http_error)?;
    if !response.status().is_success() {
        return Err(AppError::internal(format!(
            "Publish failed with HTTP {}",
            response.status()
        )));
    }
    let report: ReportRow = response.json().await.map_err(super::http_error)?;

    output::print_success(&format!("Published {} event", event.category()));
    output::print_list(&[report], format, "No report.");
    Ok(())
}
