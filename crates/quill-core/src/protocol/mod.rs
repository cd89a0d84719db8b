//! Wire frames exchanged over the hub's WebSocket connections.
//!
//! Every frame is a JSON object discriminated by its `type` field, with
//! camelCase field names. The server and the client crate both use these
//! definitions, so a frame shape exists in exactly one place.

pub mod chat;
pub mod notification;

pub use chat::{ChatClientFrame, ChatMessage, ChatServerFrame};
pub use notification::{NotificationClientFrame, NotificationControlFrame, NotificationServerFrame};
