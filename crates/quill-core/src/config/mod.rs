//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a serde default so an empty file (or no
//! file at all) yields a working configuration.

pub mod app;
pub mod client;
pub mod logging;
pub mod realtime;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::client::ClientConfig;
pub use self::logging::LoggingConfig;
pub use self::realtime::{NotificationRealtimeConfig, RealtimeConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged configuration
/// (default.toml + environment overlay + `QUILL__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Realtime hub settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Client reconnection settings.
    #[serde(default)]
    pub client: ClientConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default` with the `config/{env}` overlay and
    /// environment variables prefixed with `QUILL__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config", env)
    }

    /// Load configuration from an explicit directory.
    pub fn load_from(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("QUILL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        parsed.client.validate()?;
        tracing::debug!(dir, env, port = parsed.server.port, "Configuration loaded");
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_without_files_uses_defaults() {
        let config = AppConfig::load_from("does/not/exist", "test").unwrap();
        assert_eq!(config.realtime.history_capacity, 100);
        assert_eq!(config.realtime.max_message_length, 500);
        assert_eq!(config.client.initial_backoff_ms, 100);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let parsed: AppConfig = from_json(
            r#"{"realtime": {"history_capacity": 10}, "logging": {"format": "pretty"}}"#,
        );
        assert_eq!(parsed.realtime.history_capacity, 10);
        assert_eq!(parsed.realtime.typing_expiry_ms, 1000);
        assert_eq!(parsed.logging.format, "pretty");
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_load_rejects_zero_attempt_budget() {
        let dir = std::env::temp_dir().join(format!("quill-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("default.toml"), "[client]\nmax_attempts = 0\n").unwrap();

        let err = AppConfig::load_from(dir.to_str().unwrap(), "none").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    fn from_json(json: &str) -> AppConfig {
        serde_json::from_str(json).unwrap()
    }
}
