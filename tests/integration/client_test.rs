//! The client crate against a live hub.

use std::time::Duration;

use serde_json::json;

use quill_client::{ChatClient, ConnectionState, NotificationClient, NotificationPresenter, Presentation};
use quill_core::events::NotificationCategory;
use quill_core::protocol::ChatServerFrame;

use crate::helpers::{SeverableProxy, TestServer, next_json, next_of_type, test_config};

#[tokio::test]
async fn test_chat_client_round_trip() {
    let server = TestServer::spawn().await;
    let (client, mut frames) = ChatClient::connect(&server.client_config(), "Alice").unwrap();
    client.manager().wait_until_settled().await.unwrap();

    assert!(matches!(
        frames.recv().await,
        Some(ChatServerFrame::MessageHistory { .. })
    ));
    client.send_message("hello").await.unwrap();
    match frames.recv().await {
        Some(ChatServerFrame::Message(m)) => {
            assert_eq!(m.pen_name, "Alice");
            assert_eq!(m.content, "hello");
        }
        other => panic!("expected own message, got {other:?}"),
    }
    client.logout().await;
}

#[tokio::test]
async fn test_client_reclaims_name_after_unclean_drop() {
    let mut config = test_config();
    config.realtime.heartbeat_timeout_ms = 800;
    config.realtime.sweep_interval_ms = 100;
    let server = TestServer::spawn_with(config).await;
    let proxy = SeverableProxy::spawn(server.addr).await;

    let (client, mut frames) = ChatClient::connect(&proxy.client_config(), "Alice").unwrap();
    client.manager().wait_until_settled().await.unwrap();
    assert!(matches!(
        frames.recv().await,
        Some(ChatServerFrame::MessageHistory { .. })
    ));
    client.send_message("before the drop").await.unwrap();
    assert!(matches!(
        frames.recv().await,
        Some(ChatServerFrame::Message(m)) if m.content == "before the drop"
    ));

    // The hub keeps the old session, and the name, until its sweep runs, so
    // the first retries are refused as taken.
    proxy.sever();
    client
        .manager()
        .wait_for_state(ConnectionState::Connecting)
        .await
        .unwrap();
    assert_eq!(proxy.ghosts().await, 1);
    assert!(!server.engine.identity.check_available("Alice").unwrap());

    let status = tokio::time::timeout(
        Duration::from_secs(10),
        client.manager().wait_for_state(ConnectionState::Connected),
    )
    .await
    .expect("client never reconnected")
    .unwrap();
    assert_eq!(status.attempt, 0);
    assert_eq!(client.pen_name(), "Alice");

    let history = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match frames.recv().await {
                Some(ChatServerFrame::MessageHistory { messages }) => return messages,
                Some(_) => continue,
                None => panic!("frame channel closed"),
            }
        }
    })
    .await
    .expect("no history replay after reconnect");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "before the drop");

    assert_eq!(server.engine.chat.len(), 1);
    assert_eq!(server.engine.metrics.snapshot().heartbeat_timeouts, 1);
    client.logout().await;
}

#[tokio::test]
async fn test_taken_name_puts_client_in_error() {
    let server = TestServer::spawn().await;
    let (_holder, _) = server.join("Alice").await;

    let (client, _frames) = ChatClient::connect(&server.client_config(), "Alice").unwrap();
    let err = client.manager().wait_until_settled().await.unwrap_err();
    assert!(err.is_pen_name_taken());
    assert_eq!(client.state(), ConnectionState::Error);
    client.logout().await;
}

#[tokio::test]
async fn test_rename_swaps_session_and_keeps_it_on_conflict() {
    let server = TestServer::spawn().await;
    let (mut watcher, _) = server.join("Watcher").await;
    let (_bob, _) = server.join("Bob").await;
    next_of_type(&mut watcher, "userJoined").await;

    let (client, _frames) = ChatClient::connect(&server.client_config(), "Alice").unwrap();
    client.manager().wait_until_settled().await.unwrap();
    assert_eq!(next_of_type(&mut watcher, "userJoined").await["penName"], "Alice");

    let err = client.rename("Bob").await.unwrap_err();
    assert!(err.is_pen_name_taken());
    assert_eq!(client.pen_name(), "Alice");
    assert_eq!(client.state(), ConnectionState::Connected);

    assert_eq!(client.rename("Quill").await.unwrap(), "Quill");
    assert_eq!(client.pen_name(), "Quill");

    // The new session's join and the old one's leave race each other.
    let mut roster_changes = Vec::new();
    while roster_changes.len() < 2 {
        let frame = next_json(&mut watcher).await;
        if frame["type"] == "userJoined" || frame["type"] == "userLeft" {
            roster_changes.push(frame);
        }
    }
    roster_changes.sort_by_key(|f| f["type"].as_str().map(str::to_string));
    assert_eq!(
        roster_changes,
        vec![
            json!({"type": "userJoined", "penName": "Quill"}),
            json!({"type": "userLeft", "penName": "Alice"}),
        ]
    );
    client.logout().await;
}

#[tokio::test]
async fn test_notification_client_presents_events() {
    let server = TestServer::spawn().await;
    let (client, mut frames) = NotificationClient::connect(
        &server.client_config(),
        vec![NotificationCategory::System],
        NotificationPresenter::new(true),
    )
    .unwrap();
    client.manager().wait_until_settled().await.unwrap();

    // The subscription ack proves the filters are in place.
    let ack = frames.recv().await.unwrap();
    assert_eq!(client.present(&ack), None);

    server
        .publish(json!({"kind": "system", "title": "Maintenance", "message": "Tonight"}))
        .await;
    let event = tokio::time::timeout(Duration::from_secs(5), frames.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        client.present(&event),
        Some(Presentation::SystemAlert {
            title: "Maintenance".into(),
            body: "Tonight".into(),
        })
    );
    client.logout().await;
}
