//! Shared value types.

pub mod id;
pub mod pen_name;

pub use id::{ClaimToken, ConnectionId, MessageId};
pub use pen_name::PenName;
