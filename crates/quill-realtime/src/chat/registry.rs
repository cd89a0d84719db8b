//! Chat connection registry: session lifecycle and inbound frame routing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use quill_core::config::RealtimeConfig;
use quill_core::error::AppError;
use quill_core::protocol::{ChatClientFrame, ChatServerFrame};
use quill_core::result::AppResult;
use quill_core::types::{ConnectionId, PenName};

use crate::connection::{ConnectionPool, HeartbeatPolicy};
use crate::identity::{PenNameAllocator, PenNameClaim};
use crate::message::{MessageContent, decode};
use crate::metrics::RealtimeMetrics;
use crate::presence::TypingAggregator;

use super::broadcaster::MessageBroadcaster;
use super::session::{ChatIdentity, ChatSession};

/// Health view of one chat session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Connection ID.
    pub connection_id: ConnectionId,
    /// Bound pen name.
    pub pen_name: PenName,
    /// Admission time.
    pub connected_at: DateTime<Utc>,
}

/// Owns every live chat session.
#[derive(Debug)]
pub struct ChatRegistry {
    identity: PenNameAllocator,
    pool: ConnectionPool<ChatServerFrame, ChatIdentity>,
    broadcaster: Arc<MessageBroadcaster>,
    typing: Arc<TypingAggregator>,
    heartbeat: HeartbeatPolicy,
    max_message_length: usize,
    metrics: Arc<RealtimeMetrics>,
    shutdown: CancellationToken,
}

impl ChatRegistry {
    /// Creates a new registry.
    pub fn new(
        config: &RealtimeConfig,
        identity: PenNameAllocator,
        broadcaster: Arc<MessageBroadcaster>,
        typing: Arc<TypingAggregator>,
        metrics: Arc<RealtimeMetrics>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            identity,
            pool: ConnectionPool::new(config.channel_buffer_size),
            broadcaster,
            typing,
            heartbeat: HeartbeatPolicy::new(config.heartbeat_timeout()),
            max_message_length: config.max_message_length,
            metrics,
            shutdown,
        }
    }

    /// Reserve `raw_name` and admit a session bound to it.
    pub async fn register(
        &self,
        raw_name: &str,
    ) -> AppResult<(Arc<ChatSession>, mpsc::Receiver<ChatServerFrame>)> {
        let claim = self.identity.reserve(raw_name)?;
        Ok(self.register_claimed(claim).await)
    }

    /// Admit a session for an already reserved name.
    ///
    /// The returned receiver yields the history replay first, then live
    /// frames.
    pub async fn register_claimed(
        &self,
        claim: PenNameClaim,
    ) -> (Arc<ChatSession>, mpsc::Receiver<ChatServerFrame>) {
        let (session, rx) = self
            .pool
            .open(ChatIdentity::new(claim), self.shutdown.child_token());
        self.pool.add(session.clone());
        self.broadcaster.admit(session.clone()).await;
        self.metrics.record_chat_opened();

        info!(
            conn_id = %session.id,
            pen_name = %session.meta.pen_name,
            "Chat session registered"
        );
        (session, rx)
    }

    /// Remove a session, clear its typing indicator, announce `userLeft`,
    /// and free its pen name. Unknown or already removed IDs are a no-op.
    pub async fn unregister(&self, conn_id: &ConnectionId) -> bool {
        let Some(session) = self.pool.remove(conn_id) else {
            return false;
        };
        session.close();
        self.typing.stop(&session.meta.pen_name).await;
        self.broadcaster.remove(&session).await;
        session.meta.release();
        self.metrics.record_chat_closed();

        info!(
            conn_id = %conn_id,
            pen_name = %session.meta.pen_name,
            "Chat session unregistered"
        );
        true
    }

    /// Record liveness and answer with `pong`.
    pub fn heartbeat(&self, conn_id: &ConnectionId) -> AppResult<()> {
        let session = self.session(conn_id)?;
        session.touch();
        let outcome = session.send(ChatServerFrame::Pong);
        self.metrics.record_delivery(outcome);
        Ok(())
    }

    /// Process one text frame from a client.
    ///
    /// Invalid frames and rejected content are answered with an `error`
    /// frame to the sender only; the returned error is reserved for an
    /// unknown connection.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw: &str) -> AppResult<()> {
        let session = self.session(conn_id)?;

        let frame: ChatClientFrame = match decode(raw) {
            Ok(frame) => frame,
            Err(err) => {
                debug!(conn_id = %conn_id, error = %err, "Rejected chat frame");
                session.send(ChatServerFrame::error(&err));
                return Ok(());
            }
        };
        session.touch();
        self.handle_frame(&session, frame).await;
        Ok(())
    }

    /// Act on a decoded frame. `session` may have been unregistered since it
    /// was looked up; the broadcaster then drops anything it would announce.
    async fn handle_frame(&self, session: &Arc<ChatSession>, frame: ChatClientFrame) {
        let conn_id = &session.id;
        match frame {
            ChatClientFrame::Message { content } => {
                match MessageContent::parse(&content, self.max_message_length) {
                    Ok(content) => {
                        self.typing.stop(&session.meta.pen_name).await;
                        self.broadcaster.send(session, content).await;
                    }
                    Err(err) => {
                        debug!(conn_id = %conn_id, error = %err, "Rejected chat message");
                        session.send(ChatServerFrame::error(&err));
                    }
                }
            }
            ChatClientFrame::TypingStart => {
                self.typing.start(&session.meta.pen_name, session.id).await;
            }
            ChatClientFrame::TypingStop => {
                self.typing.stop(&session.meta.pen_name).await;
            }
            ChatClientFrame::Ping => {
                let outcome = session.send(ChatServerFrame::Pong);
                self.metrics.record_delivery(outcome);
            }
        }
    }

    /// Unregister every session that went silent or was marked dead.
    pub async fn sweep_stale(&self, now: Instant) -> usize {
        let stale = self.pool.filter(|s| self.heartbeat.should_reap(s, now));
        let mut reaped = 0;
        for session in stale {
            if session.is_alive() {
                self.metrics.record_heartbeat_timeout();
                warn!(
                    conn_id = %session.id,
                    pen_name = %session.meta.pen_name,
                    "Chat heartbeat timeout"
                );
            }
            if self.unregister(&session.id).await {
                reaped += 1;
            }
        }
        reaped
    }

    /// Unregister every session.
    pub async fn close_all(&self) {
        for session in self.pool.all_in_order() {
            self.unregister(&session.id).await;
        }
    }

    /// Look up a live session.
    pub fn session(&self, conn_id: &ConnectionId) -> AppResult<Arc<ChatSession>> {
        self.pool
            .get(conn_id)
            .ok_or_else(|| AppError::not_found(format!("Chat connection {conn_id} not found")))
    }

    /// Pen names in the room, in registration order.
    pub async fn roster(&self) -> Vec<PenName> {
        self.broadcaster.roster().await
    }

    /// Health snapshot of all sessions, in registration order.
    pub fn sessions(&self) -> Vec<SessionInfo> {
        self.pool
            .all_in_order()
            .iter()
            .map(|s| SessionInfo {
                connection_id: s.id,
                pen_name: s.meta.pen_name.clone(),
                connected_at: s.connected_at,
            })
            .collect()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// Whether the room is empty.
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// The pen name allocator backing this registry.
    pub fn identity(&self) -> &PenNameAllocator {
        &self.identity
    }
}
