//! Reconnecting connection manager.
//!
//! One background task owns the socket. It walks the
//! `disconnected → connecting → connected` state machine, retries with
//! exponential backoff, pings on an interval to catch half-open sockets, and
//! re-sends the channel's handshake frames after every (re)connect. The
//! caller talks to it through a command channel and watches its status.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use quill_core::config::ClientConfig;
use quill_core::error::{AppError, ErrorKind};
use quill_core::events::NotificationCategory;
use quill_core::protocol::{
    ChatServerFrame, NotificationClientFrame, NotificationControlFrame, NotificationServerFrame,
};
use quill_core::result::AppResult;

use crate::backoff::Backoff;
use crate::state::{ConnectionState, ConnectionStatus};
use crate::transport::{Connector, Endpoint, FrameSink, Transport};

const PING: &str = r#"{"type":"ping"}"#;
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const COMMAND_BUFFER: usize = 64;
const FRAME_BUFFER: usize = 256;

/// A frame type the manager can receive and recognize heartbeats in.
pub trait ServerFrame: DeserializeOwned + Send + 'static {
    /// Whether this frame answers a ping.
    fn is_pong(&self) -> bool;
}

impl ServerFrame for ChatServerFrame {
    fn is_pong(&self) -> bool {
        matches!(self, ChatServerFrame::Pong)
    }
}

impl ServerFrame for NotificationServerFrame {
    fn is_pong(&self) -> bool {
        matches!(
            self,
            NotificationServerFrame::Control(NotificationControlFrame::Pong)
        )
    }
}

/// What the manager connects to, and what it re-sends on every connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// Chat room under a pen name. Registration is the handshake itself.
    Chat {
        /// Current pen name.
        pen_name: String,
    },
    /// Notification channel with saved filters.
    Notifications {
        /// Saved category filters.
        filters: Vec<NotificationCategory>,
        /// Whether system-level alerts are allowed.
        permission_granted: bool,
    },
}

impl Channel {
    /// Endpoint to open for this channel.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Chat { pen_name } => Endpoint::Chat {
                pen_name: pen_name.clone(),
            },
            Self::Notifications { .. } => Endpoint::Notifications,
        }
    }

    /// Pen name, for chat channels.
    pub fn pen_name(&self) -> Option<&str> {
        match self {
            Self::Chat { pen_name } => Some(pen_name),
            Self::Notifications { .. } => None,
        }
    }

    fn handshake_frames(&self) -> AppResult<Vec<String>> {
        match self {
            Self::Chat { .. } => Ok(Vec::new()),
            Self::Notifications {
                filters,
                permission_granted,
            } => {
                let subscribe = NotificationClientFrame::Subscribe {
                    filters: filters.clone(),
                    permission_granted: *permission_granted,
                };
                Ok(vec![serde_json::to_string(&subscribe)?])
            }
        }
    }
}

enum Command {
    Send {
        text: String,
        reply: oneshot::Sender<AppResult<()>>,
    },
    Resubscribe {
        filters: Vec<NotificationCategory>,
        permission_granted: bool,
    },
    Reconnect,
    Adopt {
        transport: Transport,
        channel: Channel,
    },
}

/// Cloneable sender half of a [`ConnectionManager`].
#[derive(Clone)]
pub struct ManagerHandle {
    commands: mpsc::Sender<Command>,
}

impl std::fmt::Debug for ManagerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerHandle").finish_non_exhaustive()
    }
}

impl ManagerHandle {
    /// Send one frame on the live connection. Fails with a connection error
    /// when there is none.
    pub async fn send<T: Serialize>(&self, frame: &T) -> AppResult<()> {
        let text = serde_json::to_string(frame)?;
        let (reply, rx) = oneshot::channel();
        self.command(Command::Send { text, reply }).await?;
        rx.await.map_err(|_| stopped())?
    }

    /// Replace the saved notification filters and push them to the hub.
    pub async fn resubscribe(
        &self,
        filters: Vec<NotificationCategory>,
        permission_granted: bool,
    ) -> AppResult<()> {
        self.command(Command::Resubscribe {
            filters,
            permission_granted,
        })
        .await
    }

    /// Leave the `error` state, or drop the current socket and reconnect.
    pub async fn reconnect(&self) -> AppResult<()> {
        self.command(Command::Reconnect).await
    }

    /// Swap in an already-open transport for `channel`, closing the old one.
    pub async fn adopt(&self, transport: Transport, channel: Channel) -> AppResult<()> {
        self.command(Command::Adopt { transport, channel }).await
    }

    async fn command(&self, command: Command) -> AppResult<()> {
        self.commands.send(command).await.map_err(|_| stopped())
    }
}

fn stopped() -> AppError {
    AppError::connection("Connection manager has stopped")
}

/// Owner of one reconnecting connection.
pub struct ConnectionManager<F> {
    handle: ManagerHandle,
    status: watch::Receiver<ConnectionStatus>,
    channel: watch::Receiver<Channel>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    _frames: PhantomData<fn() -> F>,
}

impl<F: ServerFrame> ConnectionManager<F> {
    /// Start connecting in the background. Inbound frames other than pongs
    /// arrive on the returned receiver.
    pub fn spawn(
        connector: Arc<dyn Connector>,
        channel: Channel,
        config: &ClientConfig,
    ) -> (Self, mpsc::Receiver<F>) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (frames_tx, frames_rx) = mpsc::channel(FRAME_BUFFER);
        let (status_tx, status_rx) =
            watch::channel(ConnectionStatus::new(ConnectionState::Connecting));
        let (channel_tx, channel_rx) = watch::channel(channel.clone());
        let cancel = CancellationToken::new();

        let worker = Worker {
            connector,
            channel,
            channel_tx,
            backoff: Backoff::from_config(config),
            ping_interval: config.ping_interval(),
            missed_pong_threshold: config.missed_pong_threshold.max(1),
            commands: commands_rx,
            frames: frames_tx,
            status: status_tx,
            last_error: None,
            held_name: false,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(worker.run());

        let manager = Self {
            handle: ManagerHandle {
                commands: commands_tx,
            },
            status: status_rx,
            channel: channel_rx,
            cancel,
            task: Some(task),
            _frames: PhantomData,
        };
        (manager, frames_rx)
    }

    /// Wait until the first connection attempt settles: `Ok` once connected,
    /// the failure once the manager enters `error` or stops.
    pub async fn wait_until_settled(&self) -> AppResult<()> {
        let mut status = self.status.clone();
        let settled = status
            .wait_for(|s| s.state != ConnectionState::Connecting)
            .await
            .map_err(|_| stopped())?
            .clone();
        match settled.state {
            ConnectionState::Connected => Ok(()),
            _ => Err(settled.last_error.unwrap_or_else(stopped)),
        }
    }

    /// Wait until the manager reaches `state`.
    pub async fn wait_for_state(&self, state: ConnectionState) -> AppResult<ConnectionStatus> {
        let mut status = self.status.clone();
        let reached = status
            .wait_for(|s| s.state == state)
            .await
            .map_err(|_| stopped())?
            .clone();
        Ok(reached)
    }
}

impl<F> ConnectionManager<F> {
    /// Command handle, cloneable into other tasks.
    pub fn handle(&self) -> &ManagerHandle {
        &self.handle
    }

    /// Subscribe to status changes.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    /// Channel the manager currently (re)connects to.
    pub fn channel(&self) -> Channel {
        self.channel.borrow().clone()
    }

    pub(crate) fn channel_watch(&self) -> watch::Receiver<Channel> {
        self.channel.clone()
    }

    /// Close the connection cleanly and stop retrying. Terminal.
    pub async fn logout(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Connection task ended abnormally");
            }
        }
    }
}

impl<F> Drop for ConnectionManager<F> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<F> std::fmt::Debug for ConnectionManager<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("channel", &*self.channel.borrow())
            .finish_non_exhaustive()
    }
}

enum Step {
    Connect,
    Retry,
    Idle,
    Adopt(Transport),
}

enum Wake {
    Elapsed,
    Reconnect,
    Adopt(Transport),
    Stop,
}

enum Session {
    Stop,
    Restart,
    Lost(AppError),
    Replaced(Transport),
}

struct Worker<F> {
    connector: Arc<dyn Connector>,
    channel: Channel,
    channel_tx: watch::Sender<Channel>,
    backoff: Backoff,
    ping_interval: Duration,
    missed_pong_threshold: u32,
    commands: mpsc::Receiver<Command>,
    frames: mpsc::Sender<F>,
    status: watch::Sender<ConnectionStatus>,
    last_error: Option<AppError>,
    /// Whether the server has accepted the current channel at least once.
    held_name: bool,
    cancel: CancellationToken,
}

impl<F: ServerFrame> Worker<F> {
    async fn run(mut self) {
        let mut step = Step::Connect;
        loop {
            let transport = match step {
                Step::Connect => match self.connect().await {
                    Some(Ok(transport)) => transport,
                    Some(Err(err)) => {
                        step = self.after_failure(err);
                        continue;
                    }
                    None => break,
                },
                Step::Retry => {
                    self.publish(ConnectionState::Connecting);
                    let Some(delay) = self.backoff.next_delay() else {
                        warn!(attempts = self.backoff.attempts(), "Reconnect attempts exhausted");
                        self.publish(ConnectionState::Error);
                        step = Step::Idle;
                        continue;
                    };
                    debug!(
                        delay_ms = delay.as_millis() as u64,
                        attempt = self.backoff.attempts(),
                        "Reconnecting after backoff"
                    );
                    match self.wait(Some(delay)).await {
                        Wake::Elapsed => {
                            step = Step::Connect;
                            continue;
                        }
                        Wake::Reconnect => {
                            self.backoff.reset();
                            step = Step::Connect;
                            continue;
                        }
                        Wake::Adopt(transport) => transport,
                        Wake::Stop => break,
                    }
                }
                Step::Idle => match self.wait(None).await {
                    Wake::Elapsed | Wake::Reconnect => {
                        self.backoff.reset();
                        step = Step::Connect;
                        continue;
                    }
                    Wake::Adopt(transport) => transport,
                    Wake::Stop => break,
                },
                Step::Adopt(transport) => transport,
            };

            self.backoff.reset();
            self.last_error = None;
            step = match self.run_connected(transport).await {
                Session::Stop => break,
                Session::Restart => Step::Connect,
                Session::Lost(err) => {
                    warn!(error = %err, "Connection lost");
                    self.last_error = Some(err);
                    Step::Retry
                }
                Session::Replaced(transport) => Step::Adopt(transport),
            };
        }
        self.publish(ConnectionState::Disconnected);
        info!("Connection manager stopped");
    }

    /// One handshake. `None` means cancelled.
    async fn connect(&mut self) -> Option<AppResult<Transport>> {
        self.publish(ConnectionState::Connecting);
        let endpoint = self.channel.endpoint();
        let attempt = tokio::time::timeout(HANDSHAKE_TIMEOUT, self.connector.connect(&endpoint));
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            result = attempt => Some(result.unwrap_or_else(|_| {
                Err(AppError::timeout("WebSocket handshake timed out"))
            })),
        }
    }

    /// A refused name is final on a first connect. Once the server has held
    /// the name for us, the refusal is most likely our own dead session that
    /// the heartbeat sweep has not reaped yet, so it is retried.
    fn after_failure(&mut self, err: AppError) -> Step {
        let ghost = self.held_name && err.kind == ErrorKind::PenNameTaken;
        if err.kind.is_retryable() || ghost {
            debug!(error = %err, "Connection attempt failed");
            self.last_error = Some(err);
            Step::Retry
        } else {
            warn!(error = %err, "Connection refused; not retrying");
            self.last_error = Some(err);
            self.publish(ConnectionState::Error);
            Step::Idle
        }
    }

    /// Sleep for `delay` (forever if `None`) while serving commands.
    async fn wait(&mut self, delay: Option<Duration>) -> Wake {
        let sleep = async move {
            match delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return Wake::Stop,
                _ = &mut sleep => return Wake::Elapsed,
                command = self.commands.recv() => {
                    match command {
                        None => return Wake::Stop,
                        Some(Command::Reconnect) => return Wake::Reconnect,
                        Some(Command::Adopt { transport, channel }) => {
                            self.set_channel(channel);
                            return Wake::Adopt(transport);
                        }
                        Some(Command::Send { reply, .. }) => {
                            let _ = reply.send(Err(AppError::connection("Not connected")));
                        }
                        Some(Command::Resubscribe { filters, permission_granted }) => {
                            self.save_filters(filters, permission_granted);
                        }
                    }
                }
            }
        }
    }

    async fn run_connected(&mut self, transport: Transport) -> Session {
        let Transport {
            mut sink,
            mut stream,
        } = transport;

        if let Err(err) = send_handshake(&self.channel, &mut sink).await {
            return Session::Lost(err);
        }
        self.held_name = true;
        self.publish(ConnectionState::Connected);
        info!(endpoint = ?self.channel.endpoint(), "Connected");

        let mut ping = tokio::time::interval_at(Instant::now() + self.ping_interval, self.ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut missed = 0u32;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = sink.close().await;
                    return Session::Stop;
                }
                command = self.commands.recv() => {
                    match command {
                        None => {
                            let _ = sink.close().await;
                            return Session::Stop;
                        }
                        Some(Command::Send { text, reply }) => {
                            let result = sink.send(text).await;
                            let failure = result.as_ref().err().cloned();
                            let _ = reply.send(result);
                            if let Some(err) = failure {
                                return Session::Lost(err);
                            }
                        }
                        Some(Command::Resubscribe { filters, permission_granted }) => {
                            self.save_filters(filters, permission_granted);
                            if let Err(err) = send_handshake(&self.channel, &mut sink).await {
                                return Session::Lost(err);
                            }
                        }
                        Some(Command::Reconnect) => {
                            let _ = sink.close().await;
                            return Session::Restart;
                        }
                        Some(Command::Adopt { transport, channel }) => {
                            let _ = sink.close().await;
                            self.set_channel(channel);
                            return Session::Replaced(transport);
                        }
                    }
                }
                _ = ping.tick() => {
                    if missed >= self.missed_pong_threshold {
                        let _ = sink.close().await;
                        return Session::Lost(AppError::timeout(format!(
                            "No pong after {missed} pings"
                        )));
                    }
                    missed += 1;
                    if let Err(err) = sink.send(PING.to_string()).await {
                        return Session::Lost(err);
                    }
                }
                inbound = stream.next() => {
                    match inbound {
                        Some(Ok(text)) => match serde_json::from_str::<F>(&text) {
                            Ok(frame) if frame.is_pong() => missed = 0,
                            Ok(frame) => {
                                if self.frames.send(frame).await.is_err() {
                                    debug!("Frame receiver dropped");
                                }
                            }
                            Err(err) => debug!(error = %err, "Ignoring undecodable frame"),
                        },
                        Some(Err(err)) => return Session::Lost(err),
                        None => {
                            return Session::Lost(AppError::connection("Connection closed by server"));
                        }
                    }
                }
            }
        }
    }

    fn save_filters(&mut self, filters: Vec<NotificationCategory>, permission_granted: bool) {
        if let Channel::Notifications { .. } = self.channel {
            self.set_channel(Channel::Notifications {
                filters,
                permission_granted,
            });
        } else {
            debug!("Ignoring filter update on a chat channel");
        }
    }

    fn set_channel(&mut self, channel: Channel) {
        if channel.endpoint() != self.channel.endpoint() {
            self.held_name = false;
        }
        self.channel_tx.send_replace(channel.clone());
        self.channel = channel;
    }

    /// Publish `state`. Transitions the state machine does not allow are
    /// logged and dropped.
    fn publish(&self, state: ConnectionState) {
        let attempt = self.backoff.attempts();
        let last_error = self.last_error.clone();
        self.status.send_if_modified(|status| {
            if !status.state.can_transition_to(state) {
                warn!(from = %status.state, to = %state, "Illegal connection state transition");
                return false;
            }
            if status.state != state {
                info!(from = %status.state, to = %state, "Connection state changed");
            }
            status.state = state;
            status.attempt = attempt;
            status.last_error = last_error;
            true
        });
    }
}

async fn send_handshake(channel: &Channel, sink: &mut FrameSink) -> AppResult<()> {
    for text in channel.handshake_frames()? {
        sink.send(text).await?;
    }
    Ok(())
}
