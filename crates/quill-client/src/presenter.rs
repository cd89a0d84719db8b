//! Choosing how a notification is surfaced.

use std::fmt;

use tracing::debug;

use quill_core::events::{NotificationCategory, NotificationEvent};
use quill_core::protocol::NotificationServerFrame;
use quill_core::result::AppResult;

/// How a notification should be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    /// An OS-level alert. Only used with permission.
    SystemAlert {
        /// Alert title.
        title: String,
        /// Alert body.
        body: String,
    },
    /// Inside the application's own UI.
    InApp {
        /// Event category, for styling.
        category: NotificationCategory,
        /// Title.
        title: String,
        /// Body.
        body: String,
    },
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SystemAlert { title, body } => write!(f, "[alert] {title}: {body}"),
            Self::InApp {
                category,
                title,
                body,
            } => write!(f, "[{category}] {title}: {body}"),
        }
    }
}

/// Maps incoming events to a [`Presentation`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationPresenter {
    permission_granted: bool,
}

impl NotificationPresenter {
    /// Create a presenter with a known permission state.
    pub fn new(permission_granted: bool) -> Self {
        Self { permission_granted }
    }

    /// Create a presenter from the outcome of a permission request. A
    /// refusal (or any failure to ask) falls back to in-app display.
    pub fn from_permission(result: AppResult<()>) -> Self {
        match result {
            Ok(()) => Self::new(true),
            Err(err) => {
                debug!(error = %err, "Notification permission unavailable, using in-app display");
                Self::new(false)
            }
        }
    }

    /// Whether system alerts may be shown.
    pub fn permission_granted(&self) -> bool {
        self.permission_granted
    }

    /// Decide how to show `event`.
    pub fn present(&self, event: &NotificationEvent) -> Presentation {
        if self.permission_granted {
            Presentation::SystemAlert {
                title: event.title.clone(),
                body: event.body.clone(),
            }
        } else {
            Presentation::InApp {
                category: event.category,
                title: event.title.clone(),
                body: event.body.clone(),
            }
        }
    }

    /// Like [`present`](Self::present), ignoring control frames.
    pub fn present_frame(&self, frame: &NotificationServerFrame) -> Option<Presentation> {
        match frame {
            NotificationServerFrame::Event(event) => Some(self.present(event)),
            NotificationServerFrame::Control(_) => None,
        }
    }
}
