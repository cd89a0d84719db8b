//! Ordered chat fan-out.
//!
//! Every frame on the chat channel passes through one lock, so all sessions
//! connected over an overlapping interval see the same relative order.
//! Admission happens under the same lock: a joiner's history snapshot and
//! its subscription are taken atomically with respect to `send`.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use quill_core::protocol::{ChatMessage, ChatServerFrame};
use quill_core::types::{ConnectionId, MessageId, PenName};

use crate::connection::Delivery;
use crate::message::MessageContent;
use crate::metrics::RealtimeMetrics;

use super::history::HistoryBuffer;
use super::session::ChatSession;

#[derive(Debug)]
struct BroadcastState {
    history: HistoryBuffer,
    next_id: MessageId,
    /// Keyed by registration sequence, so iteration is registration order.
    subscribers: BTreeMap<u64, Arc<ChatSession>>,
}

/// Single writer for chat messages, history, and room membership frames.
#[derive(Debug)]
pub struct MessageBroadcaster {
    state: Mutex<BroadcastState>,
    metrics: Arc<RealtimeMetrics>,
}

impl MessageBroadcaster {
    /// Create a broadcaster keeping `history_capacity` messages.
    pub fn new(history_capacity: usize, metrics: Arc<RealtimeMetrics>) -> Self {
        Self {
            state: Mutex::new(BroadcastState {
                history: HistoryBuffer::new(history_capacity),
                next_id: 1,
                subscribers: BTreeMap::new(),
            }),
            metrics,
        }
    }

    /// Replay history to `session`, subscribe it to live frames, and announce
    /// it to everyone already in the room.
    pub async fn admit(&self, session: Arc<ChatSession>) {
        let mut state = self.state.lock().await;

        let replay = ChatServerFrame::MessageHistory {
            messages: state.history.snapshot(),
        };
        let outcome = session.send(replay);
        self.note(&session, outcome);

        let joined = ChatServerFrame::UserJoined {
            pen_name: session.meta.pen_name.to_string(),
        };
        self.fan_out(&state, &joined, Some(session.id));
        state.subscribers.insert(session.seq, session);
    }

    /// Unsubscribe `session` and announce its departure. Returns `false` if
    /// it was not subscribed.
    pub async fn remove(&self, session: &ChatSession) -> bool {
        let mut state = self.state.lock().await;
        if state.subscribers.remove(&session.seq).is_none() {
            return false;
        }
        let left = ChatServerFrame::UserLeft {
            pen_name: session.meta.pen_name.to_string(),
        };
        self.fan_out(&state, &left, None);
        true
    }

    /// Assign the next ID, append to history, and fan the message out to
    /// every subscriber, the author included.
    ///
    /// Returns `None` without touching history if `author` has already left
    /// the room, so nobody sees a message after its author's `userLeft`.
    pub async fn send(&self, author: &ChatSession, content: MessageContent) -> Option<ChatMessage> {
        let mut state = self.state.lock().await;
        if !state.subscribers.contains_key(&author.seq) {
            tracing::debug!(conn_id = %author.id, "Dropping message from departed session");
            return None;
        }
        let pen_name = &author.meta.pen_name;
        let message = ChatMessage {
            id: state.next_id,
            pen_name: pen_name.to_string(),
            content: content.into_inner(),
            timestamp: Utc::now(),
        };
        state.next_id += 1;
        state.history.push(message.clone());
        self.fan_out(&state, &ChatServerFrame::Message(message.clone()), None);
        self.metrics.record_chat_message();
        tracing::debug!(message_id = message.id, pen_name = %pen_name, "Chat message sent");
        Some(message)
    }

    /// Fan an arbitrary frame out in order, optionally skipping one connection.
    pub async fn broadcast(&self, frame: &ChatServerFrame, except: Option<ConnectionId>) {
        let state = self.state.lock().await;
        self.fan_out(&state, frame, except);
    }

    /// Fan `frame` out to everyone but `origin`, only while `origin` is still
    /// in the room. Returns whether it was sent.
    pub async fn broadcast_from(&self, origin: ConnectionId, frame: &ChatServerFrame) -> bool {
        let state = self.state.lock().await;
        if !state.subscribers.values().any(|s| s.id == origin) {
            return false;
        }
        self.fan_out(&state, frame, Some(origin));
        true
    }

    /// Current history, oldest first.
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.state.lock().await.history.snapshot()
    }

    /// Pen names of subscribed sessions in registration order.
    pub async fn roster(&self) -> Vec<PenName> {
        self.state
            .lock()
            .await
            .subscribers
            .values()
            .map(|s| s.meta.pen_name.clone())
            .collect()
    }

    /// Number of subscribed sessions.
    pub async fn subscriber_count(&self) -> usize {
        self.state.lock().await.subscribers.len()
    }

    fn fan_out(&self, state: &BroadcastState, frame: &ChatServerFrame, except: Option<ConnectionId>) {
        for session in state.subscribers.values() {
            if Some(session.id) == except {
                continue;
            }
            let outcome = session.send(frame.clone());
            self.note(session, outcome);
        }
    }

    fn note(&self, session: &ChatSession, outcome: Delivery) {
        self.metrics.record_delivery(outcome);
        if outcome != Delivery::Queued {
            // A gap in the ordered stream is never acceptable; evict instead.
            if session.is_alive() {
                tracing::warn!(
                    conn_id = %session.id,
                    pen_name = %session.meta.pen_name,
                    "Evicting slow chat consumer"
                );
            }
            session.mark_dead();
        }
    }
}
