//! Typing indicators.
//!
//! Lock order is typing state, then the broadcaster. The broadcaster never
//! calls back into this module.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use quill_core::protocol::ChatServerFrame;
use quill_core::types::{ConnectionId, PenName};

use crate::chat::MessageBroadcaster;
use crate::metrics::RealtimeMetrics;

#[derive(Debug, Clone)]
struct TypingState {
    origin: ConnectionId,
    expires_at: Instant,
}

/// Tracks who is typing and broadcasts start/stop transitions.
#[derive(Debug)]
pub struct TypingAggregator {
    active: Mutex<HashMap<PenName, TypingState>>,
    expiry: Duration,
    broadcaster: Arc<MessageBroadcaster>,
    metrics: Arc<RealtimeMetrics>,
}

impl TypingAggregator {
    /// Create an aggregator whose indicators lapse after `expiry`.
    pub fn new(
        expiry: Duration,
        broadcaster: Arc<MessageBroadcaster>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            active: Mutex::new(HashMap::new()),
            expiry,
            broadcaster,
            metrics,
        }
    }

    /// Mark `pen_name` as typing. Only the first call of a run broadcasts;
    /// later calls just push the expiry out.
    pub async fn start(&self, pen_name: &PenName, origin: ConnectionId) {
        let mut active = self.active.lock().await;
        let expires_at = Instant::now() + self.expiry;
        if let Some(state) = active.get_mut(pen_name) {
            state.expires_at = expires_at;
            return;
        }
        let frame = ChatServerFrame::TypingStart {
            pen_name: pen_name.to_string(),
        };
        // A typist that already left must not leave an indicator behind.
        if self.broadcaster.broadcast_from(origin, &frame).await {
            active.insert(pen_name.clone(), TypingState { origin, expires_at });
        }
    }

    /// Clear `pen_name`'s indicator. Returns whether it was active.
    pub async fn stop(&self, pen_name: &PenName) -> bool {
        let mut active = self.active.lock().await;
        let Some(state) = active.remove(pen_name) else {
            return false;
        };
        self.announce_stop(pen_name, state.origin).await;
        true
    }

    /// Remove every indicator past its expiry, broadcasting one stop each.
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut active = self.active.lock().await;
        let expired: Vec<(PenName, ConnectionId)> = active
            .iter()
            .filter(|(_, state)| state.expires_at <= now)
            .map(|(name, state)| (name.clone(), state.origin))
            .collect();
        for (name, origin) in &expired {
            active.remove(name);
            self.metrics.record_typing_expiry();
            tracing::debug!(pen_name = %name, "Typing indicator expired");
            self.announce_stop(name, *origin).await;
        }
        expired.len()
    }

    /// Pen names currently typing, sorted.
    pub async fn typing_now(&self) -> Vec<PenName> {
        let mut names: Vec<_> = self.active.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    async fn announce_stop(&self, pen_name: &PenName, origin: ConnectionId) {
        let frame = ChatServerFrame::TypingStop {
            pen_name: pen_name.to_string(),
        };
        self.broadcaster.broadcast(&frame, Some(origin)).await;
    }
}
