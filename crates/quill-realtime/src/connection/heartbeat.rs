//! Heartbeat timeout policy.
//!
//! Clients ping; the server only records the time of the last valid frame.
//! The owning registry's sweep asks this policy which connections to reap.

use std::time::Duration;

use tokio::time::Instant;

use super::handle::ConnectionHandle;

/// Heartbeat configuration
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatPolicy {
    /// Silence after which a connection is considered gone
    pub timeout: Duration,
}

impl HeartbeatPolicy {
    /// Create a policy with the given timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Whether `handle` must be reaped at `now`: either marked dead by a
    /// failed delivery, or silent for longer than the timeout.
    pub fn should_reap<F, M>(&self, handle: &ConnectionHandle<F, M>, now: Instant) -> bool {
        !handle.is_alive() || self.is_expired(handle, now)
    }

    /// Whether the heartbeat of `handle` is older than the timeout.
    pub fn is_expired<F, M>(&self, handle: &ConnectionHandle<F, M>, now: Instant) -> bool {
        now.saturating_duration_since(handle.last_heartbeat()) > self.timeout
    }
}
