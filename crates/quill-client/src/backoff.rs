//! Exponential reconnect backoff.

use std::time::Duration;

use quill_core::config::ClientConfig;

/// Doubling delay from a floor to a ceiling, bounded by an attempt budget.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    max_attempts: u32,
    attempt: u32,
}

impl Backoff {
    /// Create a backoff policy.
    pub fn new(initial: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            initial,
            max: max.max(initial),
            max_attempts,
            attempt: 0,
        }
    }

    /// Build from client settings.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
            config.max_attempts,
        )
    }

    /// Delay before the next attempt, or `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(self.attempt);
        let delay = self.initial.saturating_mul(factor).min(self.max);
        self.attempt += 1;
        Some(delay)
    }

    /// Attempts made since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Start over after a successful connection or a manual reconnect.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubles_up_to_cap_then_stops() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(5), 10);
        let delays: Vec<u64> = std::iter::from_fn(|| backoff.next_delay())
            .map(|d| d.as_millis() as u64)
            .collect();
        assert_eq!(
            delays,
            vec![100, 200, 400, 800, 1600, 3200, 5000, 5000, 5000, 5000]
        );
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.attempts(), 10);
    }

    #[test]
    fn test_reset_restarts_from_floor() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(5), 3);
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_large_attempt_counts_saturate() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(5), 64);
        let last = std::iter::from_fn(|| backoff.next_delay()).last();
        assert_eq!(last, Some(Duration::from_secs(5)));
    }
}
