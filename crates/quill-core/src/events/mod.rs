//! Forum domain events and the notifications derived from them.
//!
//! The CRUD layer produces [`ForumEvent`]s; the realtime hub formats each
//! into a [`NotificationEvent`] and fans it out to connected clients.

pub mod category;
pub mod forum;
pub mod notification;

pub use category::NotificationCategory;
pub use forum::{ForumEvent, PollOptionResult};
pub use notification::NotificationEvent;
