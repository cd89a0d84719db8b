//! Notification hub: connection lifecycle and category-filtered publish.
//!
//! Delivery is best effort and live only: nothing is queued for a client
//! that is not connected when an event is published.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use quill_core::config::RealtimeConfig;
use quill_core::error::AppError;
use quill_core::events::{NotificationCategory, NotificationEvent};
use quill_core::protocol::{
    NotificationClientFrame, NotificationControlFrame, NotificationServerFrame,
};
use quill_core::result::AppResult;
use quill_core::types::ConnectionId;

use crate::connection::{ConnectionHandle, ConnectionPool, Delivery, HeartbeatPolicy};
use crate::message::decode;
use crate::metrics::RealtimeMetrics;

use super::subscription::ClientSubscription;

/// A connection on the notification channel.
pub type NotificationSession = ConnectionHandle<NotificationServerFrame, RwLock<ClientSubscription>>;

/// Outcome of one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    /// Connections the event was queued to.
    pub delivered: usize,
    /// Connections whose filters excluded the category.
    pub filtered: usize,
    /// Connections whose queue was full or closed.
    pub dropped: usize,
}

/// Owns every notification connection.
#[derive(Debug)]
pub struct NotificationHub {
    pool: ConnectionPool<NotificationServerFrame, RwLock<ClientSubscription>>,
    heartbeat: HeartbeatPolicy,
    metrics: Arc<RealtimeMetrics>,
    shutdown: CancellationToken,
}

impl NotificationHub {
    /// Create an empty hub.
    pub fn new(
        config: &RealtimeConfig,
        metrics: Arc<RealtimeMetrics>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool: ConnectionPool::new(config.channel_buffer_size),
            heartbeat: HeartbeatPolicy::new(config.heartbeat_timeout()),
            metrics,
            shutdown,
        }
    }

    /// Open a connection with the default subscription.
    pub fn register(&self) -> (Arc<NotificationSession>, mpsc::Receiver<NotificationServerFrame>) {
        let (session, rx) = self.pool.open(
            RwLock::new(ClientSubscription::default()),
            self.shutdown.child_token(),
        );
        self.pool.add(session.clone());
        self.metrics.record_notification_opened();
        info!(conn_id = %session.id, "Notification connection registered");
        (session, rx)
    }

    /// Remove a connection. Unknown IDs are a no-op.
    pub fn unregister(&self, conn_id: &ConnectionId) -> bool {
        let Some(session) = self.pool.remove(conn_id) else {
            return false;
        };
        session.close();
        self.metrics.record_notification_closed();
        info!(conn_id = %conn_id, "Notification connection unregistered");
        true
    }

    /// Replace a connection's filters and acknowledge with the effective set.
    pub async fn update_subscription(
        &self,
        conn_id: &ConnectionId,
        filters: Vec<NotificationCategory>,
        permission_granted: bool,
    ) -> AppResult<Vec<NotificationCategory>> {
        let session = self.session(conn_id)?;
        let effective = {
            let mut sub = session.meta.write().await;
            *sub = ClientSubscription::new(filters, permission_granted);
            sub.sorted_categories()
        };
        debug!(conn_id = %conn_id, filters = ?effective, "Subscription updated");
        session.send(
            NotificationControlFrame::Subscribed {
                filters: effective.clone(),
            }
            .into(),
        );
        Ok(effective)
    }

    /// Record liveness and answer with `pong`.
    pub fn heartbeat(&self, conn_id: &ConnectionId) -> AppResult<()> {
        let session = self.session(conn_id)?;
        session.touch();
        session.send(NotificationControlFrame::Pong.into());
        Ok(())
    }

    /// Process one text frame from a client. Malformed frames are answered
    /// with an `error` frame.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw: &str) -> AppResult<()> {
        let session = self.session(conn_id)?;
        let frame: NotificationClientFrame = match decode(raw) {
            Ok(frame) => frame,
            Err(err) => {
                debug!(conn_id = %conn_id, error = %err, "Rejected notification frame");
                session.send(NotificationControlFrame::error(&err).into());
                return Ok(());
            }
        };
        session.touch();

        match frame {
            NotificationClientFrame::Subscribe {
                filters,
                permission_granted,
            } => {
                self.update_subscription(conn_id, filters, permission_granted)
                    .await?;
            }
            NotificationClientFrame::Ping => self.heartbeat(conn_id)?,
        }
        Ok(())
    }

    /// Deliver `event` to every connection subscribed to its category.
    pub async fn publish(&self, event: &NotificationEvent) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let frame = NotificationServerFrame::Event(event.clone());

        for session in self.pool.all_in_order() {
            if !session.meta.read().await.accepts(event.category) {
                report.filtered += 1;
                continue;
            }
            let outcome = session.send(frame.clone());
            self.metrics.record_delivery(outcome);
            match outcome {
                Delivery::Queued => report.delivered += 1,
                Delivery::Dropped | Delivery::Closed => report.dropped += 1,
            }
        }

        self.metrics.record_published(report.delivered);
        debug!(
            category = %event.category,
            delivered = report.delivered,
            filtered = report.filtered,
            dropped = report.dropped,
            "Notification published"
        );
        report
    }

    /// Remove every connection that went silent or whose writer is gone.
    pub fn sweep_stale(&self, now: Instant) -> usize {
        let stale = self.pool.filter(|s| self.heartbeat.should_reap(s, now));
        let mut reaped = 0;
        for session in stale {
            if session.is_alive() {
                self.metrics.record_heartbeat_timeout();
                warn!(conn_id = %session.id, "Notification heartbeat timeout");
            }
            if self.unregister(&session.id) {
                reaped += 1;
            }
        }
        reaped
    }

    /// Remove every connection.
    pub fn close_all(&self) {
        for session in self.pool.all_in_order() {
            self.unregister(&session.id);
        }
    }

    /// Look up a live connection.
    pub fn session(&self, conn_id: &ConnectionId) -> AppResult<Arc<NotificationSession>> {
        self.pool.get(conn_id).ok_or_else(|| {
            AppError::not_found(format!("Notification connection {conn_id} not found"))
        })
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Whether no client is connected.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
