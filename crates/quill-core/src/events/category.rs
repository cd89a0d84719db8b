//! Notification categories.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Category of a notification event. Serialized as the frame `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationCategory {
    /// A post was created.
    NewPost,
    /// A comment was added to a post.
    NewComment,
    /// A poll was opened.
    NewPoll,
    /// A poll closed and its results are final.
    PollResults,
    /// An announcement was published.
    NewAnnouncement,
    /// A post received a like.
    PostLike,
    /// A post was reported for moderation.
    PostReport,
    /// A comment received a reaction.
    CommentReaction,
    /// Operational message from the hub or its admins.
    System,
    /// Diagnostic event used to verify notification delivery.
    Test,
}

impl NotificationCategory {
    /// Every category, in declaration order.
    pub const ALL: [NotificationCategory; 10] = [
        Self::NewPost,
        Self::NewComment,
        Self::NewPoll,
        Self::PollResults,
        Self::NewAnnouncement,
        Self::PostLike,
        Self::PostReport,
        Self::CommentReaction,
        Self::System,
        Self::Test,
    ];

    /// Wire name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewPost => "newPost",
            Self::NewComment => "newComment",
            Self::NewPoll => "newPoll",
            Self::PollResults => "pollResults",
            Self::NewAnnouncement => "newAnnouncement",
            Self::PostLike => "postLike",
            Self::PostReport => "postReport",
            Self::CommentReaction => "commentReaction",
            Self::System => "system",
            Self::Test => "test",
        }
    }

    /// Filter set a connection gets before it sends its own `subscribe`.
    pub fn default_filters() -> HashSet<NotificationCategory> {
        Self::ALL
            .into_iter()
            .filter(|c| *c != Self::Test)
            .collect()
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown notification category: {s}")))
    }
}
