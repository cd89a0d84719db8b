//! Coalescing of rapid repeat events within a time window.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

/// Lets the first event per key through and suppresses repeats until the
/// window has passed since that first event.
#[derive(Debug)]
pub struct EventCoalescer {
    window: Duration,
    last_seen: Mutex<HashMap<String, Instant>>,
}

impl EventCoalescer {
    /// Create a coalescer with the given window. A zero window disables it.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Whether an event under `key` should be published now.
    pub fn should_publish(&self, key: &str) -> bool {
        if self.window.is_zero() {
            return true;
        }
        let mut map = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        if let Some(last) = map.get(key) {
            if now.duration_since(*last) < self.window {
                return false;
            }
        }

        map.insert(key.to_string(), now);
        true
    }

    /// Drop keys whose window has long passed.
    pub fn cleanup(&self) -> usize {
        let mut map = self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let cutoff = self.window * 10;
        let before = map.len();
        map.retain(|_, v| now.duration_since(*v) < cutoff);
        before - map.len()
    }

    /// Number of tracked keys.
    pub fn tracked(&self) -> usize {
        self.last_seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
