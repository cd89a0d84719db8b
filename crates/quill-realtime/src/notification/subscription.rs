//! Per-connection category filters.

use std::collections::HashSet;

use quill_core::events::NotificationCategory;

/// What a notification client wants to receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSubscription {
    /// Categories delivered to this connection.
    pub categories: HashSet<NotificationCategory>,
    /// Whether the client may raise system-level alerts. Informational on
    /// the server side; presentation is decided by the client.
    pub permission_granted: bool,
}

impl ClientSubscription {
    /// Replace the filter set.
    pub fn new(
        categories: impl IntoIterator<Item = NotificationCategory>,
        permission_granted: bool,
    ) -> Self {
        Self {
            categories: categories.into_iter().collect(),
            permission_granted,
        }
    }

    /// Whether events of `category` pass the filter.
    pub fn accepts(&self, category: NotificationCategory) -> bool {
        self.categories.contains(&category)
    }

    /// Filters in a stable order, for acknowledgements.
    pub fn sorted_categories(&self) -> Vec<NotificationCategory> {
        let mut categories: Vec<_> = self.categories.iter().copied().collect();
        categories.sort();
        categories
    }
}

impl Default for ClientSubscription {
    fn default() -> Self {
        Self {
            categories: NotificationCategory::default_filters(),
            permission_granted: false,
        }
    }
}
