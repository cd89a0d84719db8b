//! HTTP endpoints driven through the router.

use http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();
    let response = app.request("GET", "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_detailed_health_check() {
    let app = TestApp::new();
    let response = app.request("GET", "/api/health/detailed", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let realtime = &response.body["realtime"];
    assert_eq!(realtime["chatSessions"], json!([]));
    assert_eq!(realtime["notificationConnections"], 0);
    assert_eq!(realtime["historyLen"], 0);
    assert!(realtime["metrics"]["chatMessagesSent"].is_u64());
}

#[tokio::test]
async fn test_pen_name_availability() {
    let app = TestApp::new();

    let response = app
        .request("POST", "/api/chat/pen-name/check", Some(json!({"penName": "Quill"})))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["available"], true);

    let _claim = app.engine.identity.reserve("Quill").unwrap();
    let response = app
        .request("POST", "/api/chat/pen-name/check", Some(json!({"penName": "  Quill "})))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["available"], false);

    // Exact comparison: a different case is a different name.
    let response = app
        .request("POST", "/api/chat/pen-name/check", Some(json!({"penName": "quill"})))
        .await;
    assert_eq!(response.body["available"], true);
}

#[tokio::test]
async fn test_invalid_pen_name_is_rejected() {
    let app = TestApp::new();

    let response = app
        .request("POST", "/api/chat/pen-name/check", Some(json!({"penName": "   "})))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");

    let long = "x".repeat(64);
    let response = app
        .request("POST", "/api/chat/pen-name/check", Some(json!({"penName": long})))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_publish_with_no_listeners() {
    let app = TestApp::new();
    let response = app
        .request(
            "POST",
            "/api/events",
            Some(json!({"kind": "system", "title": "Maintenance", "message": "Back soon"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["delivered"], 0);
    assert_eq!(response.body["coalesced"], false);
}
