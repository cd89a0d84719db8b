//! Chat channel frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::MessageId;

/// An immutable chat message as stored in history and broadcast live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Monotonic message ID.
    pub id: MessageId,
    /// Author pen name.
    pub pen_name: String,
    /// Message text.
    pub content: String,
    /// Server-assigned timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Frames sent by a chat client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ChatClientFrame {
    /// Post a chat message.
    Message {
        /// Message text.
        content: String,
    },
    /// The user started (or is still) typing.
    TypingStart,
    /// The user stopped typing.
    TypingStop,
    /// Heartbeat.
    Ping,
}

/// Frames sent by the server on the chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ChatServerFrame {
    /// A live chat message.
    Message(ChatMessage),
    /// A peer started typing.
    TypingStart {
        /// Pen name of the typist.
        pen_name: String,
    },
    /// A peer stopped typing (explicitly, by sending, or by expiry).
    TypingStop {
        /// Pen name of the typist.
        pen_name: String,
    },
    /// A peer joined the room.
    UserJoined {
        /// Pen name of the joiner.
        pen_name: String,
    },
    /// A peer left the room (cleanly or by heartbeat timeout).
    UserLeft {
        /// Pen name of the leaver.
        pen_name: String,
    },
    /// History replay, sent once before any live frame.
    MessageHistory {
        /// Buffered messages, oldest first.
        messages: Vec<ChatMessage>,
    },
    /// Heartbeat reply.
    Pong,
    /// A request from this client was rejected.
    Error {
        /// Machine-readable code.
        code: String,
        /// Description.
        message: String,
    },
}

impl ChatServerFrame {
    /// Build an `error` frame for the originating client.
    pub fn error(err: &AppError) -> Self {
        Self::Error {
            code: err.kind.code().to_string(),
            message: err.message.clone(),
        }
    }
}
