//! Notification client: a reconnecting notification connection with saved
//! filters and a presenter.

use std::sync::Arc;

use tokio::sync::mpsc;

use quill_core::config::ClientConfig;
use quill_core::events::NotificationCategory;
use quill_core::protocol::NotificationServerFrame;
use quill_core::result::AppResult;

use crate::manager::{Channel, ConnectionManager};
use crate::presenter::{NotificationPresenter, Presentation};
use crate::state::ConnectionState;
use crate::transport::{Connector, WsConnector};

/// A user's notification feed.
#[derive(Debug)]
pub struct NotificationClient {
    manager: ConnectionManager<NotificationServerFrame>,
    presenter: NotificationPresenter,
}

impl NotificationClient {
    /// Start listening for `filters`.
    pub fn start(
        connector: Arc<dyn Connector>,
        filters: Vec<NotificationCategory>,
        presenter: NotificationPresenter,
        config: &ClientConfig,
    ) -> (Self, mpsc::Receiver<NotificationServerFrame>) {
        let channel = Channel::Notifications {
            filters,
            permission_granted: presenter.permission_granted(),
        };
        let (manager, frames) = ConnectionManager::spawn(connector, channel, config);
        (Self { manager, presenter }, frames)
    }

    /// Start listening on the hub at `config.server_url`.
    pub fn connect(
        config: &ClientConfig,
        filters: Vec<NotificationCategory>,
        presenter: NotificationPresenter,
    ) -> AppResult<(Self, mpsc::Receiver<NotificationServerFrame>)> {
        let connector = Arc::new(WsConnector::new(&config.server_url)?);
        Ok(Self::start(connector, filters, presenter, config))
    }

    /// Replace the saved filters. They are re-sent after every reconnect.
    pub async fn update_filters(&self, filters: Vec<NotificationCategory>) -> AppResult<()> {
        self.manager
            .handle()
            .resubscribe(filters, self.presenter.permission_granted())
            .await
    }

    /// How to show `frame`, if it is an event.
    pub fn present(&self, frame: &NotificationServerFrame) -> Option<Presentation> {
        self.presenter.present_frame(frame)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    /// Underlying connection manager.
    pub fn manager(&self) -> &ConnectionManager<NotificationServerFrame> {
        &self.manager
    }

    /// Stop listening. Terminal.
    pub async fn logout(self) {
        self.manager.logout().await;
    }
}
