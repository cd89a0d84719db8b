//! WebSocket upgrade handlers.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use quill_realtime::PenNameClaim;
use quill_realtime::message::encode;

use crate::dto::request::ChatConnectQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// How long queued frames may take to flush once a connection ends.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// GET /ws/chat?penName={name}: chat WebSocket upgrade
///
/// The name is reserved before the upgrade, so a taken name is refused with
/// a plain HTTP 409.
pub async fn chat_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<ChatConnectQuery>,
) -> Result<Response, ApiError> {
    let claim = state.realtime.identity.reserve(&query.pen_name)?;
    Ok(ws.on_upgrade(move |socket| handle_chat_connection(state, claim, socket)))
}

/// GET /ws/notifications: notification WebSocket upgrade
pub async fn notifications_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_notification_connection(state, socket))
}

async fn handle_chat_connection(state: AppState, claim: PenNameClaim, socket: WebSocket) {
    let (ws_tx, mut ws_rx) = socket.split();
    let chat = state.realtime.chat.clone();

    let (session, outbound_rx) = chat.register_claimed(claim).await;
    let conn_id = session.id;
    let cancel = session.cancellation().clone();
    let writer = spawn_writer(ws_tx, outbound_rx);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(conn_id = %conn_id, "Chat connection closed by server");
                break;
            }
            next = ws_rx.next() => {
                match next {
                    Some(Ok(Message::Text(text))) => {
                        if chat.handle_inbound(&conn_id, text.as_str()).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
        }
    }

    chat.unregister(&conn_id).await;
    drop(session);
    finish_writer(writer).await;
    info!(conn_id = %conn_id, "Chat WebSocket closed");
}

async fn handle_notification_connection(state: AppState, socket: WebSocket) {
    let (ws_tx, mut ws_rx) = socket.split();
    let hub = state.realtime.notifications.clone();

    let (session, outbound_rx) = hub.register();
    let conn_id = session.id;
    let cancel = session.cancellation().clone();
    let writer = spawn_writer(ws_tx, outbound_rx);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            next = ws_rx.next() => {
                match next {
                    Some(Ok(Message::Text(text))) => {
                        if hub.handle_inbound(&conn_id, text.as_str()).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
        }
    }

    hub.unregister(&conn_id);
    drop(session);
    finish_writer(writer).await;
    info!(conn_id = %conn_id, "Notification WebSocket closed");
}

/// Forward queued frames to the socket until the queue closes.
fn spawn_writer<F>(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound_rx: mpsc::Receiver<F>,
) -> JoinHandle<()>
where
    F: Serialize + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let text = match encode(&frame) {
                Ok(text) => text,
                Err(e) => {
                    error!(error = %e, "Failed to encode outbound frame");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    })
}

/// Give the writer a moment to flush, then stop it.
async fn finish_writer(mut writer: JoinHandle<()>) {
    if tokio::time::timeout(FLUSH_TIMEOUT, &mut writer).await.is_err() {
        writer.abort();
    }
}
