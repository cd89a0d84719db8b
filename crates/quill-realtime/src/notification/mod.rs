//! Notification channel: category-filtered, best-effort event fan-out.

pub mod bridge;
pub mod dedup;
pub mod fanout;
pub mod formatter;
pub mod subscription;

pub use bridge::{EventBridge, EventReport};
pub use dedup::EventCoalescer;
pub use fanout::{DeliveryReport, NotificationHub, NotificationSession};
pub use formatter::NotificationFormatter;
pub use subscription::ClientSubscription;
