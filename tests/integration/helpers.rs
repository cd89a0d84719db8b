//! Shared test helpers for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use futures::{SinkExt, StreamExt};
use http::{Request, StatusCode};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use quill_api::{AppState, build_app};
use quill_core::config::{AppConfig, ClientConfig};
use quill_realtime::RealtimeEngine;

/// A client WebSocket.
pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Config used by every test app.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config
}

/// Test application context driven without a socket
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// The engine behind the router
    pub engine: RealtimeEngine,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let config = test_config();
        let engine = RealtimeEngine::new(config.realtime.clone());
        let router = build_app(AppState::new(config, engine.clone()));
        Self { router, engine }
    }

    /// Make an HTTP request to the test app
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

/// The full app served on an ephemeral port, with sweepers running
pub struct TestServer {
    /// Bound address
    pub addr: SocketAddr,
    /// The engine behind the server
    pub engine: RealtimeEngine,
    server: JoinHandle<()>,
}

impl TestServer {
    /// Spawn with the default test config
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    /// Spawn with a custom config
    pub async fn spawn_with(config: AppConfig) -> Self {
        let engine = RealtimeEngine::new(config.realtime.clone());
        engine.start();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local addr");
        let app = build_app(AppState::new(config, engine.clone()));
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        Self {
            addr,
            engine,
            server,
        }
    }

    /// `http://` base URL
    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client settings pointing at this server
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            server_url: self.http_url(),
            ..ClientConfig::default()
        }
    }

    /// Open a chat socket without waiting for admission
    pub async fn try_chat(&self, pen_name: &str) -> Result<Ws, tungstenite::Error> {
        let url = format!("ws://{}/ws/chat?penName={}", self.addr, pen_name);
        tokio_tungstenite::connect_async(url).await.map(|(ws, _)| ws)
    }

    /// Join the chat room and wait for the history replay, which marks
    /// admission. Returns the socket and the replayed history.
    pub async fn join(&self, pen_name: &str) -> (Ws, Value) {
        let mut ws = self.try_chat(pen_name).await.expect("Chat handshake failed");
        let history = next_json(&mut ws).await;
        assert_eq!(history["type"], "messageHistory", "unexpected first frame {history}");
        (ws, history)
    }

    /// Open a notification socket, subscribe, and wait for the ack
    pub async fn listen(&self, filters: &[&str]) -> Ws {
        let url = format!("ws://{}/ws/notifications", self.addr);
        let (mut ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .expect("Notification handshake failed");
        send_json(
            &mut ws,
            serde_json::json!({"type": "subscribe", "filters": filters, "permissionGranted": false}),
        )
        .await;
        let ack = next_json(&mut ws).await;
        assert_eq!(ack["type"], "subscribed", "unexpected ack {ack}");
        ws
    }

    /// POST a forum event and return the report
    pub async fn publish(&self, event: Value) -> Value {
        reqwest::Client::new()
            .post(format!("{}/api/events", self.http_url()))
            .json(&event)
            .send()
            .await
            .expect("Publish failed")
            .json()
            .await
            .expect("Bad publish response")
    }

    /// POST a pen name availability check
    pub async fn check(&self, pen_name: &str) -> Value {
        reqwest::Client::new()
            .post(format!("{}/api/chat/pen-name/check", self.http_url()))
            .json(&serde_json::json!({ "penName": pen_name }))
            .send()
            .await
            .expect("Check failed")
            .json()
            .await
            .expect("Bad check response")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.engine.shutdown_token().cancel();
        self.server.abort();
    }
}

/// TCP relay in front of a [`TestServer`] that can sever its client sides
/// while keeping the hub sides open, the way a dropped network looks to the
/// hub until its heartbeat sweep notices.
pub struct SeverableProxy {
    /// Address clients should dial
    pub addr: SocketAddr,
    cut: watch::Sender<u64>,
    ghosts: std::sync::Arc<Mutex<Vec<TcpStream>>>,
    task: JoinHandle<()>,
}

impl SeverableProxy {
    /// Relay every accepted connection to `upstream`
    pub async fn spawn(upstream: SocketAddr) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind proxy");
        let addr = listener.local_addr().expect("No proxy addr");
        let (cut, _) = watch::channel(0u64);
        let ghosts = std::sync::Arc::new(Mutex::new(Vec::new()));

        let cut_tx = cut.clone();
        let held = ghosts.clone();
        let task = tokio::spawn(async move {
            while let Ok((mut client, _)) = listener.accept().await {
                let mut cut_rx = cut_tx.subscribe();
                let held = held.clone();
                tokio::spawn(async move {
                    let Ok(mut hub) = TcpStream::connect(upstream).await else {
                        return;
                    };
                    let severed = tokio::select! {
                        _ = tokio::io::copy_bidirectional(&mut client, &mut hub) => false,
                        _ = cut_rx.changed() => true,
                    };
                    if severed {
                        held.lock().await.push(hub);
                        drop(client);
                    }
                });
            }
        });

        Self {
            addr,
            cut,
            ghosts,
            task,
        }
    }

    /// Client settings dialing through the proxy, pinging every 200ms
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            server_url: format!("http://{}", self.addr),
            ping_interval_ms: 200,
            ..ClientConfig::default()
        }
    }

    /// Drop every live client side; hub sides stay open and silent
    pub fn sever(&self) {
        self.cut.send_modify(|generation| *generation += 1);
    }

    /// Number of hub sides left dangling by [`Self::sever`]
    pub async fn ghosts(&self) -> usize {
        self.ghosts.lock().await.len()
    }
}

impl Drop for SeverableProxy {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Send one JSON frame
pub async fn send_json(ws: &mut Ws, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("Send failed");
}

/// Next text frame as JSON, failing the test after a timeout
pub async fn next_json(ws: &mut Ws) -> Value {
    try_next_json(ws, FRAME_TIMEOUT)
        .await
        .expect("Timed out waiting for a frame")
}

/// Next text frame as JSON, or `None` if nothing arrives within `wait`
pub async fn try_next_json(ws: &mut Ws, wait: Duration) -> Option<Value> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let msg = tokio::time::timeout_at(deadline, ws.next()).await.ok()??;
        match msg.expect("Socket error") {
            Message::Text(text) => {
                return Some(serde_json::from_str(text.as_str()).expect("Frame is not JSON"));
            }
            Message::Close(_) => return None,
            _ => continue,
        }
    }
}

/// Skip frames until one of `kind` arrives
pub async fn next_of_type(ws: &mut Ws, kind: &str) -> Value {
    loop {
        let frame = next_json(ws).await;
        if frame["type"] == kind {
            return frame;
        }
    }
}
