//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::connection::Delivery;

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Chat connections admitted
    pub chat_connections_opened: AtomicU64,
    /// Chat connections unregistered
    pub chat_connections_closed: AtomicU64,
    /// Notification connections opened
    pub notification_connections_opened: AtomicU64,
    /// Notification connections closed
    pub notification_connections_closed: AtomicU64,
    /// Chat messages accepted
    pub chat_messages_sent: AtomicU64,
    /// Frames queued to a connection
    pub frames_delivered: AtomicU64,
    /// Frames lost to a full or closed queue
    pub deliveries_dropped: AtomicU64,
    /// Notification events published
    pub notifications_published: AtomicU64,
    /// Notification events queued to a connection
    pub notifications_delivered: AtomicU64,
    /// Notification events suppressed as rapid repeats
    pub notifications_coalesced: AtomicU64,
    /// Connections reaped for missing heartbeats
    pub heartbeat_timeouts: AtomicU64,
    /// Typing indicators that expired without an explicit stop
    pub typing_expiries: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one delivery attempt by outcome.
    pub fn record_delivery(&self, outcome: Delivery) {
        match outcome {
            Delivery::Queued => inc(&self.frames_delivered),
            Delivery::Dropped | Delivery::Closed => inc(&self.deliveries_dropped),
        }
    }

    /// Record an admitted chat connection
    pub fn record_chat_opened(&self) {
        inc(&self.chat_connections_opened);
    }

    /// Record an unregistered chat connection
    pub fn record_chat_closed(&self) {
        inc(&self.chat_connections_closed);
    }

    /// Record an opened notification connection
    pub fn record_notification_opened(&self) {
        inc(&self.notification_connections_opened);
    }

    /// Record a closed notification connection
    pub fn record_notification_closed(&self) {
        inc(&self.notification_connections_closed);
    }

    /// Record an accepted chat message
    pub fn record_chat_message(&self) {
        inc(&self.chat_messages_sent);
    }

    /// Record a published notification and how many connections got it
    pub fn record_published(&self, delivered: usize) {
        inc(&self.notifications_published);
        self.notifications_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
    }

    /// Record a coalesced notification
    pub fn record_coalesced(&self) {
        inc(&self.notifications_coalesced);
    }

    /// Record a heartbeat timeout
    pub fn record_heartbeat_timeout(&self) {
        inc(&self.heartbeat_timeouts);
    }

    /// Record an expired typing indicator
    pub fn record_typing_expiry(&self) {
        inc(&self.typing_expiries);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            chat_connections_opened: load(&self.chat_connections_opened),
            chat_connections_closed: load(&self.chat_connections_closed),
            notification_connections_opened: load(&self.notification_connections_opened),
            notification_connections_closed: load(&self.notification_connections_closed),
            chat_messages_sent: load(&self.chat_messages_sent),
            frames_delivered: load(&self.frames_delivered),
            deliveries_dropped: load(&self.deliveries_dropped),
            notifications_published: load(&self.notifications_published),
            notifications_delivered: load(&self.notifications_delivered),
            notifications_coalesced: load(&self.notifications_coalesced),
            heartbeat_timeouts: load(&self.heartbeat_timeouts),
            typing_expiries: load(&self.typing_expiries),
        }
    }
}

fn inc(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

fn load(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Chat connections admitted
    pub chat_connections_opened: u64,
    /// Chat connections unregistered
    pub chat_connections_closed: u64,
    /// Notification connections opened
    pub notification_connections_opened: u64,
    /// Notification connections closed
    pub notification_connections_closed: u64,
    /// Chat messages accepted
    pub chat_messages_sent: u64,
    /// Frames queued to a connection
    pub frames_delivered: u64,
    /// Frames lost to a full or closed queue
    pub deliveries_dropped: u64,
    /// Notification events published
    pub notifications_published: u64,
    /// Notification events queued to a connection
    pub notifications_delivered: u64,
    /// Notification events suppressed as rapid repeats
    pub notifications_coalesced: u64,
    /// Connections reaped for missing heartbeats
    pub heartbeat_timeouts: u64,
    /// Typing indicators that expired
    pub typing_expiries: u64,
}
