//! Domain events produced by the forum CRUD layer.

use serde::{Deserialize, Serialize};

use super::category::NotificationCategory;

/// Final tally for one poll option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOptionResult {
    /// Option label.
    pub option: String,
    /// Votes received.
    pub votes: u64,
}

/// Something happened in the forum that connected clients should hear about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ForumEvent {
    /// A post was created.
    PostCreated {
        /// Post ID.
        post_id: u64,
        /// Post title.
        title: String,
        /// Author pen name, if the post was not anonymous.
        author: Option<String>,
    },
    /// A comment was added.
    CommentCreated {
        /// Parent post ID.
        post_id: u64,
        /// Comment ID.
        comment_id: u64,
        /// Parent post title.
        post_title: String,
        /// Leading text of the comment.
        excerpt: String,
    },
    /// A poll was opened.
    PollCreated {
        /// Poll ID.
        poll_id: u64,
        /// Poll question.
        question: String,
    },
    /// A poll closed.
    PollClosed {
        /// Poll ID.
        poll_id: u64,
        /// Poll question.
        question: String,
        /// Tallies per option.
        results: Vec<PollOptionResult>,
    },
    /// An admin published an announcement.
    AnnouncementPublished {
        /// Announcement ID.
        announcement_id: u64,
        /// Title.
        title: String,
        /// Body text.
        body: String,
    },
    /// A post was liked.
    PostLiked {
        /// Post ID.
        post_id: u64,
        /// Post title.
        post_title: String,
        /// Like count after this like.
        likes: u64,
    },
    /// A post was reported.
    PostReported {
        /// Post ID.
        post_id: u64,
        /// Report reason.
        reason: String,
    },
    /// A comment received a reaction.
    CommentReacted {
        /// Parent post ID.
        post_id: u64,
        /// Comment ID.
        comment_id: u64,
        /// Reaction emoji or keyword.
        reaction: String,
    },
    /// Operational message.
    System {
        /// Title.
        title: String,
        /// Message body.
        message: String,
    },
    /// Delivery check.
    Test {
        /// Optional message.
        message: Option<String>,
    },
}

impl ForumEvent {
    /// Category the resulting notification is published under.
    pub fn category(&self) -> NotificationCategory {
        match self {
            Self::PostCreated { .. } => NotificationCategory::NewPost,
            Self::CommentCreated { .. } => NotificationCategory::NewComment,
            Self::PollCreated { .. } => NotificationCategory::NewPoll,
            Self::PollClosed { .. } => NotificationCategory::PollResults,
            Self::AnnouncementPublished { .. } => NotificationCategory::NewAnnouncement,
            Self::PostLiked { .. } => NotificationCategory::PostLike,
            Self::PostReported { .. } => NotificationCategory::PostReport,
            Self::CommentReacted { .. } => NotificationCategory::CommentReaction,
            Self::System { .. } => NotificationCategory::System,
            Self::Test { .. } => NotificationCategory::Test,
        }
    }

    /// Key under which rapid repeats are coalesced, for the event kinds that
    /// tend to arrive in bursts.
    pub fn coalesce_key(&self) -> Option<String> {
        match self {
            Self::PostLiked { post_id, .. } => Some(format!("postLike:{post_id}")),
            Self::CommentReacted {
                comment_id,
                reaction,
                ..
            } => Some(format!("commentReaction:{comment_id}:{reaction}")),
            _ => None,
        }
    }
}
