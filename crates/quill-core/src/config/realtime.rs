//! Realtime hub configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Realtime (WebSocket) hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound queue size per connection.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Expected client ping interval in milliseconds.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,
    /// A session with no heartbeat for this long is reaped.
    #[serde(default = "default_heartbeat_timeout")]
    pub heartbeat_timeout_ms: u64,
    /// Interval of the stale-session sweep in milliseconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ms: u64,
    /// Chat history ring buffer capacity.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Maximum chat message length in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    /// Maximum pen name length in characters.
    #[serde(default = "default_max_pen_name_length")]
    pub max_pen_name_length: usize,
    /// Typing indicator lifetime without a refresh, in milliseconds.
    #[serde(default = "default_typing_expiry")]
    pub typing_expiry_ms: u64,
    /// Interval of the typing expiry sweep in milliseconds.
    #[serde(default = "default_typing_sweep_interval")]
    pub typing_sweep_interval_ms: u64,
    /// Notification fan-out settings.
    #[serde(default)]
    pub notifications: NotificationRealtimeConfig,
}

impl RealtimeConfig {
    /// Heartbeat timeout as a [`Duration`].
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    /// Stale-session sweep interval as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }

    /// Typing expiry as a [`Duration`].
    pub fn typing_expiry(&self) -> Duration {
        Duration::from_millis(self.typing_expiry_ms)
    }

    /// Typing sweep interval as a [`Duration`].
    pub fn typing_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.typing_sweep_interval_ms.max(1))
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            heartbeat_interval_ms: default_heartbeat_interval(),
            heartbeat_timeout_ms: default_heartbeat_timeout(),
            sweep_interval_ms: default_sweep_interval(),
            history_capacity: default_history_capacity(),
            max_message_length: default_max_message_length(),
            max_pen_name_length: default_max_pen_name_length(),
            typing_expiry_ms: default_typing_expiry(),
            typing_sweep_interval_ms: default_typing_sweep_interval(),
            notifications: NotificationRealtimeConfig::default(),
        }
    }
}

/// Notification delivery settings for the realtime hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRealtimeConfig {
    /// Window in which repeated like/reaction events for one resource are
    /// coalesced, in milliseconds. Zero disables coalescing.
    #[serde(default = "default_coalesce_window")]
    pub coalesce_window_ms: u64,
}

impl Default for NotificationRealtimeConfig {
    fn default() -> Self {
        Self {
            coalesce_window_ms: default_coalesce_window(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_heartbeat_interval() -> u64 {
    2500
}

fn default_heartbeat_timeout() -> u64 {
    5000
}

fn default_sweep_interval() -> u64 {
    1000
}

fn default_history_capacity() -> usize {
    100
}

fn default_max_message_length() -> usize {
    500
}

fn default_max_pen_name_length() -> usize {
    32
}

fn default_typing_expiry() -> u64 {
    1000
}

fn default_typing_sweep_interval() -> u64 {
    250
}

fn default_coalesce_window() -> u64 {
    500
}
