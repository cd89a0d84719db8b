//! CLI command definitions and dispatch.

pub mod chat;
pub mod check;
pub mod listen;
pub mod publish;
pub mod status;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use quill_core::config::{AppConfig, ClientConfig};
use quill_core::error::AppError;

/// Quill: pseudonymous chat and live forum notifications
#[derive(Debug, Parser)]
#[command(name = "quill", version, about, long_about = None)]
pub struct Cli {
    /// Configuration directory
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Configuration overlay to apply on top of `default`
    #[arg(long, env = "QUILL_ENV", default_value = "development")]
    pub env: String,

    /// Hub base URL, overriding `client.server_url`
    #[arg(short, long, env = "QUILL_SERVER")]
    pub server: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check whether a pen name is free
    Check(check::CheckArgs),
    /// Join the chat room
    Chat(chat::ChatArgs),
    /// Listen for forum notifications
    Listen(listen::ListenArgs),
    /// Publish a system or test notification
    Publish(publish::PublishArgs),
    /// Show hub status
    Status,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let client = self.client_config()?;
        match &self.command {
            Commands::Check(args) => check::execute(args, &client).await,
            Commands::Chat(args) => chat::execute(args, &client).await,
            Commands::Listen(args) => listen::execute(args, &client).await,
            Commands::Publish(args) => publish::execute(args, &client, self.format).await,
            Commands::Status => status::execute(&client, self.format).await,
        }
    }

    /// Client settings from the config files, with `--server` applied.
    fn client_config(&self) -> Result<ClientConfig, AppError> {
        let mut config = AppConfig::load_from(&self.config, &self.env)
            .map_err(|e| AppError::configuration(format!("Failed to load config: {}", e)))?
            .client;
        if let Some(server) = &self.server {
            config.server_url = server.clone();
        }
        Ok(config)
    }
}

/// Helper: join `path` onto the hub base URL
pub fn api_url(config: &ClientConfig, path: &str) -> Result<reqwest::Url, AppError> {
    reqwest::Url::parse(&config.server_url)
        .and_then(|base| base.join(path))
        .map_err(|e| AppError::configuration(format!("Invalid server URL: {}", e)))
}

/// Helper: map a transport failure of an HTTP call
pub fn http_error(e: reqwest::Error) -> AppError {
    AppError::connection(format!("Request failed: {}", e))
}
