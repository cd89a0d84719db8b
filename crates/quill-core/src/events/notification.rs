//! Notification event pushed to connected clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::NotificationCategory;

/// A transient, categorized notification.
///
/// Delivered at most once, and only to clients connected at publish time.
/// On the wire the category doubles as the frame discriminator:
/// `{"type": "newPost", "title": ..., "body": ..., "payload": ..., "timestamp": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Category, serialized as `type`.
    #[serde(rename = "type")]
    pub category: NotificationCategory,
    /// Short title.
    pub title: String,
    /// Human-readable body.
    pub body: String,
    /// Structured payload (resource IDs etc.).
    #[serde(default)]
    pub payload: serde_json::Value,
    /// When the event was published.
    pub timestamp: DateTime<Utc>,
}

impl NotificationEvent {
    /// Create an event stamped with the current time.
    pub fn new(
        category: NotificationCategory,
        title: impl Into<String>,
        body: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            category,
            title: title.into(),
            body: body.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_is_the_type_field() {
        let event = NotificationEvent::new(
            NotificationCategory::NewPost,
            "New post",
            "Hello",
            serde_json::json!({"postId": 7}),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "newPost");
        assert_eq!(value["payload"]["postId"], 7);
        assert!(value.get("category").is_none());
    }
}
