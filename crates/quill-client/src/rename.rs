//! Pen name availability and the rename flow.
//!
//! A rename never leaves the user without a session: the new name is
//! checked over HTTP, then claimed by opening a second socket, and only
//! once that handshake succeeds is the old socket closed.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use quill_core::error::{AppError, ErrorKind};
use quill_core::protocol::ChatServerFrame;
use quill_core::result::AppResult;

use crate::manager::{Channel, ConnectionManager};
use crate::transport::Connector;

/// Answer of the availability endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    /// Whether no live session holds the name.
    pub available: bool,
    /// Human-readable explanation.
    pub message: String,
}

/// Asks the hub whether a pen name is free.
#[async_trait]
pub trait AvailabilityCheck: Send + Sync {
    /// Check `pen_name`. Invalid names fail with a validation error.
    async fn check(&self, pen_name: &str) -> AppResult<Availability>;
}

/// [`AvailabilityCheck`] against `POST /api/chat/pen-name/check`.
#[derive(Debug, Clone)]
pub struct HttpAvailability {
    http: reqwest::Client,
    url: Url,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest<'a> {
    pen_name: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpAvailability {
    /// Create a checker for the hub at `server_url`.
    pub fn new(server_url: &str) -> AppResult<Self> {
        let url = Url::parse(server_url)
            .and_then(|base| base.join("/api/chat/pen-name/check"))
            .map_err(|e| AppError::configuration(format!("Invalid server URL '{server_url}': {e}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            url,
        })
    }
}

#[async_trait]
impl AvailabilityCheck for HttpAvailability {
    async fn check(&self, pen_name: &str) -> AppResult<Availability> {
        let response = self
            .http
            .post(self.url.clone())
            .json(&CheckRequest { pen_name })
            .send()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Connection, "Availability check failed", e))?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| "Invalid pen name".to_string());
            return Err(AppError::validation(message));
        }
        if !status.is_success() {
            return Err(AppError::connection(format!(
                "Availability check returned HTTP {status}"
            )));
        }

        response.json::<Availability>().await.map_err(|e| {
            AppError::with_source(ErrorKind::Serialization, "Malformed availability response", e)
        })
    }
}

/// Move the chat session to `new_name`.
///
/// On success the manager reconnects under the new name from then on. On
/// any failure, `PenNameTaken` included, the current session is untouched.
pub async fn rename(
    manager: &ConnectionManager<ChatServerFrame>,
    connector: &dyn Connector,
    availability: &dyn AvailabilityCheck,
    new_name: &str,
) -> AppResult<String> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(AppError::validation("Pen name is required"));
    }
    let current = manager.channel();
    if current.pen_name() == Some(new_name) {
        return Ok(new_name.to_string());
    }

    let answer = availability.check(new_name).await?;
    if !answer.available {
        debug!(pen_name = %new_name, "Rename target unavailable");
        return Err(AppError::pen_name_taken(new_name));
    }

    // The name may have been taken since the check; the handshake decides.
    let channel = Channel::Chat {
        pen_name: new_name.to_string(),
    };
    let transport = connector.connect(&channel.endpoint()).await?;

    let mut swapped = manager.channel_watch();
    manager.handle().adopt(transport, channel).await?;
    swapped
        .wait_for(|c| c.pen_name() == Some(new_name))
        .await
        .map_err(|_| AppError::connection("Connection manager has stopped"))?;

    info!(
        from = current.pen_name().unwrap_or_default(),
        to = %new_name,
        "Pen name changed"
    );
    Ok(new_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use quill_core::config::ClientConfig;

    use crate::state::ConnectionState;
    use crate::transport::Endpoint;
    use crate::transport::memory::{MemoryConnector, ServerEnd};

    struct Fixed(bool);

    #[async_trait]
    impl AvailabilityCheck for Fixed {
        async fn check(&self, _pen_name: &str) -> AppResult<Availability> {
            Ok(Availability {
                available: self.0,
                message: String::new(),
            })
        }
    }

    async fn next_server(connector: &MemoryConnector) -> ServerEnd {
        loop {
            if let Some(server) = connector.take_server() {
                return server;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn connected_as(
        connector: &Arc<MemoryConnector>,
        name: &str,
    ) -> (ConnectionManager<ChatServerFrame>, ServerEnd) {
        connector.accept();
        let (manager, _frames) = ConnectionManager::spawn(
            connector.clone(),
            Channel::Chat {
                pen_name: name.into(),
            },
            &ClientConfig::default(),
        );
        manager.wait_until_settled().await.unwrap();
        let server = next_server(connector).await;
        (manager, server)
    }

    #[tokio::test(start_paused = true)]
    async fn test_rename_swaps_connection() {
        let connector = Arc::new(MemoryConnector::new());
        let (manager, mut old) = connected_as(&connector, "Alice").await;

        connector.accept();
        let name = rename(&manager, connector.as_ref(), &Fixed(true), " Quill ")
            .await
            .unwrap();
        assert_eq!(name, "Quill");
        assert_eq!(manager.channel().pen_name(), Some("Quill"));

        // The old socket is closed cleanly.
        while old.next_frame().await.is_some() {}
        let new = next_server(&connector).await;
        assert_eq!(
            new.endpoint,
            Endpoint::Chat {
                pen_name: "Quill".into()
            }
        );
        assert_eq!(manager.state(), ConnectionState::Connected);
        manager.logout().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_name_keeps_old_session() {
        let connector = Arc::new(MemoryConnector::new());
        let (manager, _old) = connected_as(&connector, "Alice").await;

        let err = rename(&manager, connector.as_ref(), &Fixed(false), "Bob")
            .await
            .unwrap_err();
        assert!(err.is_pen_name_taken());
        assert_eq!(connector.attempts().len(), 1);
        assert_eq!(manager.channel().pen_name(), Some("Alice"));
        assert_eq!(manager.state(), ConnectionState::Connected);
        manager.logout().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_race_keeps_old_session() {
        let connector = Arc::new(MemoryConnector::new());
        let (manager, _old) = connected_as(&connector, "Alice").await;

        connector.refuse(AppError::pen_name_taken("Bob"));
        let err = rename(&manager, connector.as_ref(), &Fixed(true), "Bob")
            .await
            .unwrap_err();
        assert!(err.is_pen_name_taken());
        assert_eq!(manager.channel().pen_name(), Some("Alice"));
        assert_eq!(connector.attempts().len(), 2);
        assert_eq!(manager.state(), ConnectionState::Connected);
        manager.logout().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_name_is_a_no_op() {
        let connector = Arc::new(MemoryConnector::new());
        let (manager, _old) = connected_as(&connector, "Alice").await;
        let name = rename(&manager, connector.as_ref(), &Fixed(false), "Alice")
            .await
            .unwrap();
        assert_eq!(name, "Alice");
        assert_eq!(connector.attempts().len(), 1);
        manager.logout().await;
    }

    #[test]
    fn test_check_url() {
        let checker = HttpAvailability::new("http://localhost:8080/ignored").unwrap();
        assert_eq!(
            checker.url.as_str(),
            "http://localhost:8080/api/chat/pen-name/check"
        );
    }
}
