//! Chat client: a reconnecting chat connection plus typing and rename.

use std::sync::Arc;

use tokio::sync::mpsc;

use quill_core::config::ClientConfig;
use quill_core::error::AppError;
use quill_core::protocol::{ChatClientFrame, ChatServerFrame};
use quill_core::result::AppResult;

use crate::manager::{Channel, ConnectionManager};
use crate::rename::{AvailabilityCheck, HttpAvailability, rename};
use crate::state::ConnectionState;
use crate::transport::{Connector, WsConnector};
use crate::typing::TypingDebouncer;

/// A user's chat session.
pub struct ChatClient {
    manager: ConnectionManager<ChatServerFrame>,
    connector: Arc<dyn Connector>,
    availability: Arc<dyn AvailabilityCheck>,
    typing: TypingDebouncer,
}

impl ChatClient {
    /// Start a session under `pen_name`.
    pub fn start(
        connector: Arc<dyn Connector>,
        availability: Arc<dyn AvailabilityCheck>,
        pen_name: &str,
        config: &ClientConfig,
    ) -> (Self, mpsc::Receiver<ChatServerFrame>) {
        let channel = Channel::Chat {
            pen_name: pen_name.trim().to_string(),
        };
        let (manager, frames) = ConnectionManager::spawn(connector.clone(), channel, config);
        let typing = TypingDebouncer::new(manager.handle().clone(), config.typing_stop_delay());
        let client = Self {
            manager,
            connector,
            availability,
            typing,
        };
        (client, frames)
    }

    /// Start a session against the hub at `config.server_url`.
    pub fn connect(
        config: &ClientConfig,
        pen_name: &str,
    ) -> AppResult<(Self, mpsc::Receiver<ChatServerFrame>)> {
        let connector = Arc::new(WsConnector::new(&config.server_url)?);
        let availability = Arc::new(HttpAvailability::new(&config.server_url)?);
        Ok(Self::start(connector, availability, pen_name, config))
    }

    /// Post a message. The typing timer is only disarmed once the message is
    /// on the wire; if the send fails the pending `typingStop` still goes out.
    pub async fn send_message(&self, content: &str) -> AppResult<()> {
        if content.trim().is_empty() {
            return Err(AppError::validation("Message cannot be empty"));
        }
        self.manager
            .handle()
            .send(&ChatClientFrame::Message {
                content: content.to_string(),
            })
            .await?;
        self.typing.message_sent().await;
        Ok(())
    }

    /// Record a keystroke in the compose box.
    pub async fn keystroke(&self) -> AppResult<()> {
        self.typing.keystroke().await
    }

    /// Switch to `new_name`, keeping the current session if that fails.
    pub async fn rename(&self, new_name: &str) -> AppResult<String> {
        rename(
            &self.manager,
            self.connector.as_ref(),
            self.availability.as_ref(),
            new_name,
        )
        .await
    }

    /// Current pen name.
    pub fn pen_name(&self) -> String {
        self.manager
            .channel()
            .pen_name()
            .unwrap_or_default()
            .to_string()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    /// Underlying connection manager.
    pub fn manager(&self) -> &ConnectionManager<ChatServerFrame> {
        &self.manager
    }

    /// Leave the room. Terminal.
    pub async fn logout(self) {
        self.typing.message_sent().await;
        self.manager.logout().await;
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}
