//! Individual WebSocket connection handle.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use quill_core::types::ConnectionId;

/// Result of queueing one frame on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The frame was queued for the socket writer.
    Queued,
    /// The outbound queue was full; the frame was dropped.
    Dropped,
    /// The connection is dead or its writer has gone away.
    Closed,
}

/// A handle to a single WebSocket connection.
///
/// `F` is the outbound frame type of the channel, `M` the per-connection
/// state the owning registry keeps alongside it (the chat identity, or the
/// notification subscription).
#[derive(Debug)]
pub struct ConnectionHandle<F, M> {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Registration order within the owning pool
    pub seq: u64,
    /// Registry-specific state
    pub meta: M,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<F>,
    last_heartbeat: Mutex<Instant>,
    alive: AtomicBool,
    cancel: CancellationToken,
}

impl<F, M> ConnectionHandle<F, M> {
    /// Create a new connection handle
    pub fn new(
        seq: u64,
        meta: M,
        sender: mpsc::Sender<F>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            seq,
            meta,
            connected_at: Utc::now(),
            sender,
            last_heartbeat: Mutex::new(Instant::now()),
            alive: AtomicBool::new(true),
            cancel,
        }
    }

    /// Queue an outbound frame without waiting.
    pub fn send(&self, frame: F) -> Delivery {
        if !self.is_alive() {
            return Delivery::Closed;
        }
        match self.sender.try_send(frame) {
            Ok(()) => Delivery::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping frame");
                Delivery::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                Delivery::Closed
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead. The next sweep of the owning registry
    /// unregisters it.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Record a heartbeat.
    pub fn touch(&self) {
        let mut last = self
            .last_heartbeat
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *last = Instant::now();
    }

    /// Time of the last heartbeat.
    pub fn last_heartbeat(&self) -> Instant {
        *self
            .last_heartbeat
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Token cancelled when the connection is unregistered.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Close the connection: stop accepting frames and wake the socket task.
    pub fn close(&self) {
        self.mark_dead();
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(buffer: usize) -> (ConnectionHandle<u32, ()>, mpsc::Receiver<u32>) {
        let (tx, rx) = mpsc::channel(buffer);
        (ConnectionHandle::new(0, (), tx, CancellationToken::new()), rx)
    }

    #[tokio::test]
    async fn test_send_queues_in_order() {
        let (h, mut rx) = handle(4);
        assert_eq!(h.send(1), Delivery::Queued);
        assert_eq!(h.send(2), Delivery::Queued);
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test]
    async fn test_full_buffer_drops() {
        let (h, _rx) = handle(1);
        assert_eq!(h.send(1), Delivery::Queued);
        assert_eq!(h.send(2), Delivery::Dropped);
        assert!(h.is_alive());
    }

    #[tokio::test]
    async fn test_closed_receiver_marks_dead() {
        let (h, rx) = handle(1);
        drop(rx);
        assert_eq!(h.send(1), Delivery::Closed);
        assert!(!h.is_alive());
        assert_eq!(h.send(2), Delivery::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_moves_heartbeat() {
        let (h, _rx) = handle(1);
        let before = h.last_heartbeat();
        tokio::time::advance(std::time::Duration::from_secs(3)).await;
        h.touch();
        assert!(h.last_heartbeat() - before >= std::time::Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_close_cancels_token() {
        let (h, _rx) = handle(1);
        h.close();
        assert!(h.cancellation().is_cancelled());
        assert!(!h.is_alive());
    }
}
