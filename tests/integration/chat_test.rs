//! Chat scenarios over real WebSockets.

use std::time::Duration;

use serde_json::{Value, json};
use tokio_tungstenite::tungstenite;

use crate::helpers::{TestServer, next_json, next_of_type, send_json, try_next_json};

#[tokio::test]
async fn test_simultaneous_registration_has_one_winner() {
    let server = TestServer::spawn().await;

    let (a, b) = tokio::join!(server.try_chat("Alice"), server.try_chat("Alice"));
    let results = [a, b];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);

    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    match loser {
        tungstenite::Error::Http(response) => assert_eq!(response.status().as_u16(), 409),
        other => panic!("expected HTTP 409, got {other:?}"),
    }
}

#[tokio::test]
async fn test_late_joiner_gets_last_hundred_messages() {
    let server = TestServer::spawn().await;
    let (mut writer, _) = server.join("Writer").await;

    for i in 1..=150 {
        send_json(&mut writer, json!({"type": "message", "content": format!("m{i}")})).await;
    }
    loop {
        let frame = next_of_type(&mut writer, "message").await;
        if frame["id"] == 150 {
            break;
        }
    }

    let (_late, history) = server.join("Late").await;
    let ids: Vec<u64> = history["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, (51..=150).collect::<Vec<_>>());
    assert_eq!(history["messages"][0]["content"], "m51");
}

#[tokio::test]
async fn test_send_while_typing_emits_one_stop() {
    let server = TestServer::spawn().await;
    let (mut alice, _) = server.join("Alice").await;
    let (mut bob, _) = server.join("Bob").await;
    assert_eq!(next_json(&mut alice).await, json!({"type": "userJoined", "penName": "Bob"}));

    for _ in 0..3 {
        send_json(&mut alice, json!({"type": "typingStart"})).await;
    }
    send_json(&mut alice, json!({"type": "message", "content": "hello"})).await;

    let mut seen: Vec<Value> = Vec::new();
    loop {
        let frame = next_json(&mut bob).await;
        let done = frame["type"] == "message";
        seen.push(frame);
        if done {
            break;
        }
    }
    let kinds: Vec<&str> = seen.iter().map(|f| f["type"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["typingStart", "typingStop", "message"]);
    assert_eq!(seen[1]["penName"], "Alice");

    // Nothing further once the expiry window has passed.
    assert_eq!(try_next_json(&mut bob, Duration::from_millis(1500)).await, None);
}

#[tokio::test]
async fn test_messages_arrive_in_the_same_order_everywhere() {
    let server = TestServer::spawn().await;
    let (mut alice, _) = server.join("Alice").await;
    let (mut bob, _) = server.join("Bob").await;
    next_of_type(&mut alice, "userJoined").await;

    for i in 0..20 {
        send_json(&mut alice, json!({"type": "message", "content": format!("a{i}")})).await;
        send_json(&mut bob, json!({"type": "message", "content": format!("b{i}")})).await;
    }

    let mut orders = Vec::new();
    for ws in [&mut alice, &mut bob] {
        let mut ids = Vec::new();
        while ids.len() < 40 {
            let frame = next_of_type(ws, "message").await;
            ids.push(frame["id"].as_u64().unwrap());
        }
        orders.push(ids);
    }
    assert_eq!(orders[0], orders[1]);
    assert_eq!(orders[0], (1..=40).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_invalid_message_is_reported_to_sender_only() {
    let server = TestServer::spawn().await;
    let (mut alice, _) = server.join("Alice").await;
    let (mut bob, _) = server.join("Bob").await;
    next_of_type(&mut alice, "userJoined").await;

    send_json(&mut alice, json!({"type": "message", "content": "   "})).await;
    let error = next_json(&mut alice).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "VALIDATION_ERROR");

    send_json(&mut alice, json!({"type": "message", "content": "x".repeat(501)})).await;
    assert_eq!(next_json(&mut alice).await["type"], "error");

    send_json(&mut alice, json!({"type": "message", "content": "ok"})).await;
    let frame = next_json(&mut bob).await;
    assert_eq!(frame["type"], "message");
    assert_eq!(frame["content"], "ok");
    assert_eq!(frame["id"], 1);
}

#[tokio::test]
async fn test_leaving_frees_the_name() {
    let server = TestServer::spawn().await;
    let (mut alice, _) = server.join("Alice").await;
    let (mut bob, _) = server.join("Bob").await;
    next_of_type(&mut alice, "userJoined").await;
    assert_eq!(server.check("Bob").await["available"], false);

    bob.close(None).await.unwrap();
    assert_eq!(next_json(&mut alice).await, json!({"type": "userLeft", "penName": "Bob"}));
    let mut available = false;
    for _ in 0..20 {
        if server.check("Bob").await["available"] == true {
            available = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(available);

    let (_bob_again, _) = server.join("Bob").await;
    assert_eq!(next_json(&mut alice).await, json!({"type": "userJoined", "penName": "Bob"}));
}

#[tokio::test]
async fn test_ping_is_answered() {
    let server = TestServer::spawn().await;
    let (mut alice, _) = server.join("Alice").await;
    send_json(&mut alice, json!({"type": "ping"})).await;
    assert_eq!(next_json(&mut alice).await, json!({"type": "pong"}));
}

#[tokio::test]
async fn test_silent_client_is_reaped() {
    let mut config = crate::helpers::test_config();
    config.realtime.heartbeat_timeout_ms = 600;
    config.realtime.sweep_interval_ms = 100;
    let server = TestServer::spawn_with(config).await;

    let (mut alice, _) = server.join("Alice").await;
    let (_bob, _) = server.join("Bob").await;
    next_of_type(&mut alice, "userJoined").await;

    // Alice keeps pinging; Bob goes silent.
    let left = loop {
        send_json(&mut alice, json!({"type": "ping"})).await;
        if let Some(frame) = try_next_json(&mut alice, Duration::from_millis(100)).await {
            if frame["type"] == "userLeft" {
                break frame;
            }
        }
    };
    assert_eq!(left["penName"], "Bob");
}
