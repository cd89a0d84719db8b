//! Notification scenarios over real WebSockets.

use std::time::Duration;

use serde_json::json;

use crate::helpers::{TestServer, next_json, try_next_json};

fn new_post(id: u64) -> serde_json::Value {
    json!({"kind": "postCreated", "postId": id, "title": format!("Post {id}"), "author": null})
}

fn new_comment(post_id: u64) -> serde_json::Value {
    json!({
        "kind": "commentCreated",
        "postId": post_id,
        "commentId": 1,
        "postTitle": format!("Post {post_id}"),
        "excerpt": "Nice one"
    })
}

#[tokio::test]
async fn test_disconnected_client_never_receives_missed_event() {
    let server = TestServer::spawn().await;
    let mut a = server.listen(&["newPost", "newComment"]).await;
    a.close(None).await.unwrap();
    drop(a);

    server.publish(new_post(1)).await;

    let mut a = server.listen(&["newPost", "newComment"]).await;
    server.publish(new_comment(1)).await;

    let frame = next_json(&mut a).await;
    assert_eq!(frame["type"], "newComment");
    assert_eq!(frame["payload"]["postId"], 1);
    assert_eq!(try_next_json(&mut a, Duration::from_millis(300)).await, None);
}

#[tokio::test]
async fn test_filters_select_categories() {
    let server = TestServer::spawn().await;
    let mut system_only = server.listen(&["system"]).await;
    let mut posts_only = server.listen(&["newPost"]).await;

    let report = server.publish(new_post(7)).await;
    assert_eq!(report["delivered"], 1);
    assert_eq!(report["filtered"], 1);

    server
        .publish(json!({"kind": "system", "title": "Maintenance", "message": "Tonight"}))
        .await;

    let frame = next_json(&mut system_only).await;
    assert_eq!(frame["type"], "system");
    assert_eq!(frame["title"], "Maintenance");

    let frame = next_json(&mut posts_only).await;
    assert_eq!(frame["type"], "newPost");
    assert_eq!(try_next_json(&mut posts_only, Duration::from_millis(300)).await, None);
}

#[tokio::test]
async fn test_rapid_likes_are_coalesced() {
    let server = TestServer::spawn().await;
    let mut a = server.listen(&["postLike"]).await;

    let like = |likes: u64| json!({"kind": "postLiked", "postId": 3, "postTitle": "Post 3", "likes": likes});
    let first = server.publish(like(1)).await;
    let second = server.publish(like(2)).await;
    assert_eq!(first["coalesced"], false);
    assert_eq!(second["coalesced"], true);

    assert_eq!(next_json(&mut a).await["type"], "postLike");
    assert_eq!(try_next_json(&mut a, Duration::from_millis(200)).await, None);
}

#[tokio::test]
async fn test_test_events_need_explicit_subscription() {
    let server = TestServer::spawn().await;
    let mut opted_in = server.listen(&["test"]).await;

    let url = format!("ws://{}/ws/notifications", server.addr);
    let (mut defaults, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    crate::helpers::send_json(&mut defaults, json!({"type": "ping"})).await;
    assert_eq!(next_json(&mut defaults).await["type"], "pong");

    let report = server.publish(json!({"kind": "test", "message": null})).await;
    assert_eq!(report["delivered"], 1);
    assert_eq!(next_json(&mut opted_in).await["type"], "test");
    assert_eq!(try_next_json(&mut defaults, Duration::from_millis(200)).await, None);
}
