//! Forum event intake.
//!
//! Bridges events from the CRUD layer into the notification hub:
//! coalesce bursts, format, publish.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use quill_core::events::{ForumEvent, NotificationEvent};

use crate::metrics::RealtimeMetrics;

use super::dedup::EventCoalescer;
use super::fanout::{DeliveryReport, NotificationHub};
use super::formatter::NotificationFormatter;

/// Result of submitting one forum event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReport {
    /// Connections the notification was queued to.
    pub delivered: usize,
    /// Connections whose filters excluded it.
    pub filtered: usize,
    /// Connections whose queue was full or closed.
    pub dropped: usize,
    /// Whether the event was suppressed as a rapid repeat.
    pub coalesced: bool,
}

impl From<DeliveryReport> for EventReport {
    fn from(report: DeliveryReport) -> Self {
        Self {
            delivered: report.delivered,
            filtered: report.filtered,
            dropped: report.dropped,
            coalesced: false,
        }
    }
}

/// Turns forum events into published notifications.
#[derive(Debug)]
pub struct EventBridge {
    hub: Arc<NotificationHub>,
    coalescer: EventCoalescer,
    metrics: Arc<RealtimeMetrics>,
}

impl EventBridge {
    /// Create a new event bridge
    pub fn new(
        hub: Arc<NotificationHub>,
        coalescer: EventCoalescer,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            hub,
            coalescer,
            metrics,
        }
    }

    /// Handle one forum event.
    pub async fn submit(&self, event: &ForumEvent) -> EventReport {
        if let Some(key) = event.coalesce_key() {
            if !self.coalescer.should_publish(&key) {
                self.metrics.record_coalesced();
                tracing::trace!(key = %key, "Notification coalesced");
                return EventReport {
                    coalesced: true,
                    ..EventReport::default()
                };
            }
        }
        let notification = NotificationFormatter::format(event);
        self.publish(&notification).await.into()
    }

    /// Publish an already formatted notification, bypassing coalescing.
    pub async fn publish(&self, notification: &NotificationEvent) -> DeliveryReport {
        self.hub.publish(notification).await
    }

    /// Forget coalescing keys whose window has long passed.
    pub fn cleanup(&self) -> usize {
        self.coalescer.cleanup()
    }
}
