//! Transport seam between the connection manager and the network.
//!
//! The manager only ever sees a sink of outbound text frames and a stream of
//! inbound ones, so tests can drive it over in-memory channels.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt, future};
use reqwest::Url;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::debug;

use quill_core::error::{AppError, ErrorKind};
use quill_core::result::AppResult;

/// Outbound half of a connection.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = AppError> + Send>>;

/// Inbound half of a connection. Ends when the peer closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = AppResult<String>> + Send>>;

/// An established connection.
pub struct Transport {
    /// Outbound text frames.
    pub sink: FrameSink,
    /// Inbound text frames.
    pub stream: FrameStream,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

/// Which hub channel to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// The chat room, bound to a pen name for the life of the socket.
    Chat {
        /// Pen name presented in the handshake.
        pen_name: String,
    },
    /// The notification channel.
    Notifications,
}

/// Opens transports to the hub.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Perform the handshake for `endpoint`.
    async fn connect(&self, endpoint: &Endpoint) -> AppResult<Transport>;
}

/// [`Connector`] over real WebSockets.
#[derive(Debug, Clone)]
pub struct WsConnector {
    base_url: Url,
}

impl WsConnector {
    /// Create a connector for a hub at `server_url` (`http(s)://host:port`).
    pub fn new(server_url: &str) -> AppResult<Self> {
        let base_url = Url::parse(server_url)
            .map_err(|e| AppError::configuration(format!("Invalid server URL '{server_url}': {e}")))?;
        Ok(Self { base_url })
    }

    /// WebSocket URL for `endpoint`.
    pub fn url_for(&self, endpoint: &Endpoint) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|_| AppError::configuration(format!("Cannot derive a WebSocket URL from {}", self.base_url)))?;

        match endpoint {
            Endpoint::Chat { pen_name } => {
                url.set_path("/ws/chat");
                url.query_pairs_mut().clear().append_pair("penName", pen_name);
            }
            Endpoint::Notifications => {
                url.set_path("/ws/notifications");
                url.set_query(None);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint: &Endpoint) -> AppResult<Transport> {
        let url = self.url_for(endpoint)?;
        debug!(url = %url, "Opening WebSocket");

        let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| handshake_error(endpoint, e))?;
        let (write, read) = ws.split();

        let sink = write
            .with(|text: String| future::ready(Ok::<_, tungstenite::Error>(Message::Text(text.into()))))
            .sink_map_err(|e| AppError::with_source(ErrorKind::Connection, "WebSocket send failed", e));

        let stream = read.filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(_) => None,
                Err(e) => Some(Err(AppError::with_source(
                    ErrorKind::Connection,
                    "WebSocket receive failed",
                    e,
                ))),
            })
        });

        Ok(Transport {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}

/// Map a failed handshake to the error the state machine acts on.
fn handshake_error(endpoint: &Endpoint, err: tungstenite::Error) -> AppError {
    if let tungstenite::Error::Http(response) = &err {
        let status = response.status().as_u16();
        if status == 409 {
            if let Endpoint::Chat { pen_name } = endpoint {
                return AppError::pen_name_taken(pen_name);
            }
        }
        if status == 400 {
            return AppError::validation(format!("Handshake rejected with HTTP {status}"));
        }
    }
    AppError::with_source(ErrorKind::Connection, format!("Handshake failed: {err}"), err)
}

#[cfg(test)]
pub(crate) mod memory {
    //! Scripted in-memory connector.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use futures::channel::mpsc;

    use super::*;

    /// The hub's side of one in-memory connection.
    pub struct ServerEnd {
        pub endpoint: Endpoint,
        pub to_client: mpsc::UnboundedSender<AppResult<String>>,
        pub from_client: mpsc::UnboundedReceiver<String>,
    }

    impl ServerEnd {
        pub fn push(&self, text: &str) {
            let _ = self.to_client.unbounded_send(Ok(text.to_string()));
        }

        /// Next frame the client sent.
        pub async fn next_frame(&mut self) -> Option<serde_json::Value> {
            let text = self.from_client.next().await?;
            serde_json::from_str(&text).ok()
        }

        /// Frames the client has sent so far, without waiting.
        pub fn sent_now(&mut self) -> Vec<serde_json::Value> {
            let mut frames = Vec::new();
            while let Ok(Some(text)) = self.from_client.try_next() {
                if let Ok(value) = serde_json::from_str(&text) {
                    frames.push(value);
                }
            }
            frames
        }
    }

    /// Connector that answers each attempt from a script, refusing once the
    /// script runs out.
    #[derive(Default)]
    pub struct MemoryConnector {
        script: Mutex<VecDeque<Option<AppError>>>,
        accepted: Mutex<VecDeque<ServerEnd>>,
        attempts: Mutex<Vec<Endpoint>>,
    }

    impl MemoryConnector {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn accept(&self) -> &Self {
            self.script.lock().unwrap().push_back(None);
            self
        }

        pub fn refuse(&self, err: AppError) -> &Self {
            self.script.lock().unwrap().push_back(Some(err));
            self
        }

        pub fn take_server(&self) -> Option<ServerEnd> {
            self.accepted.lock().unwrap().pop_front()
        }

        pub fn attempts(&self) -> Vec<Endpoint> {
            self.attempts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Connector for MemoryConnector {
        async fn connect(&self, endpoint: &Endpoint) -> AppResult<Transport> {
            self.attempts.lock().unwrap().push(endpoint.clone());
            let step = self.script.lock().unwrap().pop_front();
            match step {
                Some(None) => {
                    let (to_client, client_rx) = mpsc::unbounded();
                    let (client_tx, from_client) = mpsc::unbounded();
                    self.accepted.lock().unwrap().push_back(ServerEnd {
                        endpoint: endpoint.clone(),
                        to_client,
                        from_client,
                    });
                    Ok(Transport {
                        sink: Box::pin(
                            client_tx.sink_map_err(|_| AppError::connection("memory peer gone")),
                        ),
                        stream: Box::pin(client_rx),
                    })
                }
                Some(Some(err)) => Err(err),
                None => Err(AppError::connection("connection refused")),
            }
        }
    }
}
