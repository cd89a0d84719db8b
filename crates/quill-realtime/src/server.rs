//! Top-level real-time engine that ties together all subsystems.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use quill_core::config::RealtimeConfig;
use quill_core::types::PenName;

use crate::chat::{ChatRegistry, MessageBroadcaster, SessionInfo};
use crate::identity::PenNameAllocator;
use crate::metrics::{MetricsSnapshot, RealtimeMetrics};
use crate::notification::{EventBridge, EventCoalescer, NotificationHub};
use crate::presence::TypingAggregator;
use crate::sweeper::spawn_periodic;

/// Detailed engine state for health reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    /// Live chat sessions in registration order.
    pub chat_sessions: Vec<SessionInfo>,
    /// Live notification connections.
    pub notification_connections: usize,
    /// Pen names currently typing.
    pub typing: Vec<PenName>,
    /// Messages in the history buffer.
    pub history_len: usize,
    /// Counter snapshot.
    pub metrics: MetricsSnapshot,
}

/// Central real-time engine that coordinates all WebSocket subsystems.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Pen name allocator.
    pub identity: PenNameAllocator,
    /// Chat connection registry.
    pub chat: Arc<ChatRegistry>,
    /// Ordered chat broadcaster.
    pub broadcaster: Arc<MessageBroadcaster>,
    /// Typing aggregator.
    pub typing: Arc<TypingAggregator>,
    /// Notification hub.
    pub notifications: Arc<NotificationHub>,
    /// Event bridge (forum events → notifications).
    pub events: Arc<EventBridge>,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    config: RealtimeConfig,
    shutdown: CancellationToken,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems.
    pub fn new(config: RealtimeConfig) -> Self {
        let shutdown = CancellationToken::new();
        let metrics = Arc::new(RealtimeMetrics::new());
        let identity = PenNameAllocator::new(config.max_pen_name_length);
        let broadcaster = Arc::new(MessageBroadcaster::new(
            config.history_capacity,
            metrics.clone(),
        ));
        let typing = Arc::new(TypingAggregator::new(
            config.typing_expiry(),
            broadcaster.clone(),
            metrics.clone(),
        ));
        let chat = Arc::new(ChatRegistry::new(
            &config,
            identity.clone(),
            broadcaster.clone(),
            typing.clone(),
            metrics.clone(),
            shutdown.clone(),
        ));
        let notifications = Arc::new(NotificationHub::new(
            &config,
            metrics.clone(),
            shutdown.clone(),
        ));
        let events = Arc::new(EventBridge::new(
            notifications.clone(),
            EventCoalescer::new(Duration::from_millis(
                config.notifications.coalesce_window_ms,
            )),
            metrics.clone(),
        ));

        info!("Real-time engine initialized");

        Self {
            identity,
            chat,
            broadcaster,
            typing,
            notifications,
            events,
            metrics,
            config,
            shutdown,
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Spawn the background sweepers. Must be called from a Tokio runtime.
    pub fn start(&self) {
        let mut handles = Vec::with_capacity(4);

        let chat = self.chat.clone();
        handles.push(spawn_periodic(
            "chat-heartbeat",
            self.config.sweep_interval(),
            self.shutdown.clone(),
            move || {
                let chat = chat.clone();
                async move {
                    chat.sweep_stale(tokio::time::Instant::now()).await;
                }
            },
        ));

        let notifications = self.notifications.clone();
        handles.push(spawn_periodic(
            "notification-heartbeat",
            self.config.sweep_interval(),
            self.shutdown.clone(),
            move || {
                let notifications = notifications.clone();
                async move {
                    notifications.sweep_stale(tokio::time::Instant::now());
                }
            },
        ));

        let typing = self.typing.clone();
        handles.push(spawn_periodic(
            "typing-expiry",
            self.config.typing_sweep_interval(),
            self.shutdown.clone(),
            move || {
                let typing = typing.clone();
                async move {
                    typing.sweep(tokio::time::Instant::now()).await;
                }
            },
        ));

        let events = self.events.clone();
        handles.push(spawn_periodic(
            "coalesce-cleanup",
            Duration::from_secs(30),
            self.shutdown.clone(),
            move || {
                let events = events.clone();
                async move {
                    events.cleanup();
                }
            },
        ));

        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(handles);
        info!("Real-time sweepers started");
    }

    /// Token cancelled when the engine shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Engine configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Snapshot for health reporting.
    pub async fn status(&self) -> EngineStatus {
        EngineStatus {
            chat_sessions: self.chat.sessions(),
            notification_connections: self.notifications.len(),
            typing: self.typing.typing_now().await,
            history_len: self.broadcaster.history().await.len(),
            metrics: self.metrics.snapshot(),
        }
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub async fn shutdown(&self) {
        info!("Shutting down real-time engine");

        // Stop sweepers and wake every connection task.
        self.shutdown.cancel();

        let handles: Vec<_> = self
            .tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
            .collect();
        for handle in handles {
            let _ = handle.await;
        }

        self.chat.close_all().await;
        self.notifications.close_all();

        info!("Real-time engine shut down");
    }
}
