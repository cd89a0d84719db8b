//! Forum event → notification formatting.

use serde_json::json;

use quill_core::events::{ForumEvent, NotificationEvent};

/// Longest excerpt carried in a notification body, in characters.
const EXCERPT_CHARS: usize = 120;

/// Formats forum events into user-facing notifications.
pub struct NotificationFormatter;

impl NotificationFormatter {
    /// Format any forum event.
    pub fn format(event: &ForumEvent) -> NotificationEvent {
        let category = event.category();
        let (title, body, payload) = match event {
            ForumEvent::PostCreated {
                post_id,
                title,
                author,
            } => (
                "New Post".to_string(),
                match author {
                    Some(author) => format!("{author} posted '{title}'"),
                    None => format!("New post: '{title}'"),
                },
                json!({ "postId": post_id, "title": title, "author": author }),
            ),
            ForumEvent::CommentCreated {
                post_id,
                comment_id,
                post_title,
                excerpt,
            } => (
                "New Comment".to_string(),
                format!("On '{post_title}': {}", truncate(excerpt)),
                json!({ "postId": post_id, "commentId": comment_id }),
            ),
            ForumEvent::PollCreated { poll_id, question } => (
                "New Poll".to_string(),
                question.clone(),
                json!({ "pollId": poll_id }),
            ),
            ForumEvent::PollClosed {
                poll_id,
                question,
                results,
            } => {
                let body = match results.iter().max_by_key(|r| r.votes) {
                    Some(top) => format!(
                        "'{question}' closed. Top answer: {} ({} votes)",
                        top.option, top.votes
                    ),
                    None => format!("'{question}' closed with no votes"),
                };
                (
                    "Poll Results".to_string(),
                    body,
                    json!({ "pollId": poll_id, "results": results }),
                )
            }
            ForumEvent::AnnouncementPublished {
                announcement_id,
                title,
                body,
            } => (
                title.clone(),
                truncate(body),
                json!({ "announcementId": announcement_id }),
            ),
            ForumEvent::PostLiked {
                post_id,
                post_title,
                likes,
            } => (
                "Post Liked".to_string(),
                format!("'{post_title}' now has {likes} likes"),
                json!({ "postId": post_id, "likes": likes }),
            ),
            ForumEvent::PostReported { post_id, reason } => (
                "Post Reported".to_string(),
                format!("Post #{post_id} was reported: {reason}"),
                json!({ "postId": post_id, "reason": reason }),
            ),
            ForumEvent::CommentReacted {
                post_id,
                comment_id,
                reaction,
            } => (
                "New Reaction".to_string(),
                format!("Someone reacted {reaction} to your comment"),
                json!({ "postId": post_id, "commentId": comment_id, "reaction": reaction }),
            ),
            ForumEvent::System { title, message } => {
                (title.clone(), message.clone(), serde_json::Value::Null)
            }
            ForumEvent::Test { message } => (
                "Test Notification".to_string(),
                message
                    .clone()
                    .unwrap_or_else(|| "Notifications are working".to_string()),
                serde_json::Value::Null,
            ),
        };
        NotificationEvent::new(category, title, body, payload)
    }
}

fn truncate(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
