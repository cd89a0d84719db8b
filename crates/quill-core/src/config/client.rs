//! Client reconnection and heartbeat configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Settings for the client-side reconnection manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the hub, e.g. `http://127.0.0.1:8080`.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// First reconnect delay in milliseconds.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    /// Reconnect delay ceiling in milliseconds.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
    /// Reconnect attempts before giving up and entering `error`.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Ping interval in milliseconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_ms: u64,
    /// Unanswered pings tolerated before the socket is considered half-open.
    #[serde(default = "default_missed_pong_threshold")]
    pub missed_pong_threshold: u32,
    /// Idle delay after the last keystroke before `typingStop` is sent.
    #[serde(default = "default_typing_stop_delay")]
    pub typing_stop_delay_ms: u64,
}

impl ClientConfig {
    /// Ping interval as a [`Duration`].
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms.max(1))
    }

    /// Typing stop delay as a [`Duration`].
    pub fn typing_stop_delay(&self) -> Duration {
        Duration::from_millis(self.typing_stop_delay_ms)
    }

    /// Reject settings the reconnection manager cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_attempts == 0 {
            return Err(AppError::configuration(
                "client.max_attempts must be at least 1",
            ));
        }
        if self.missed_pong_threshold == 0 {
            return Err(AppError::configuration(
                "client.missed_pong_threshold must be at least 1",
            ));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(AppError::configuration(
                "client.initial_backoff_ms exceeds client.max_backoff_ms",
            ));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            max_attempts: default_max_attempts(),
            ping_interval_ms: default_ping_interval(),
            missed_pong_threshold: default_missed_pong_threshold(),
            typing_stop_delay_ms: default_typing_stop_delay(),
        }
    }
}

fn default_server_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_initial_backoff() -> u64 {
    100
}

fn default_max_backoff() -> u64 {
    5000
}

fn default_max_attempts() -> u32 {
    10
}

fn default_ping_interval() -> u64 {
    2000
}

fn default_missed_pong_threshold() -> u32 {
    2
}

fn default_typing_stop_delay() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ClientConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_budgets_are_rejected() {
        let no_attempts = ClientConfig {
            max_attempts: 0,
            ..ClientConfig::default()
        };
        assert_eq!(
            no_attempts.validate().unwrap_err().kind,
            ErrorKind::Configuration
        );

        let no_pongs = ClientConfig {
            missed_pong_threshold: 0,
            ..ClientConfig::default()
        };
        assert_eq!(
            no_pongs.validate().unwrap_err().kind,
            ErrorKind::Configuration
        );
    }
}
