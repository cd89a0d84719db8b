//! Notification channel frames.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::events::{NotificationCategory, NotificationEvent};

/// Frames sent by a notification client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NotificationClientFrame {
    /// Replace this connection's category filters.
    Subscribe {
        /// Categories the client wants.
        filters: Vec<NotificationCategory>,
        /// Whether the client may surface events as system-level alerts.
        #[serde(default)]
        permission_granted: bool,
    },
    /// Heartbeat.
    Ping,
}

/// Control frames on the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NotificationControlFrame {
    /// Heartbeat reply.
    Pong,
    /// Subscription acknowledged.
    Subscribed {
        /// Effective filter set, sorted.
        filters: Vec<NotificationCategory>,
    },
    /// A request from this client was rejected.
    Error {
        /// Machine-readable code.
        code: String,
        /// Description.
        message: String,
    },
}

impl NotificationControlFrame {
    /// Build an `error` frame for the originating client.
    pub fn error(err: &AppError) -> Self {
        Self::Error {
            code: err.kind.code().to_string(),
            message: err.message.clone(),
        }
    }
}

/// Anything the server sends on the notification channel.
///
/// Event frames use their category as `type`, so the two shapes share the
/// discriminator namespace and are told apart structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotificationServerFrame {
    /// A published notification.
    Event(NotificationEvent),
    /// A control frame.
    Control(NotificationControlFrame),
}

impl From<NotificationEvent> for NotificationServerFrame {
    fn from(event: NotificationEvent) -> Self {
        Self::Event(event)
    }
}

impl From<NotificationControlFrame> for NotificationServerFrame {
    fn from(frame: NotificationControlFrame) -> Self {
        Self::Control(frame)
    }
}
