//! Connection status as seen by the user.

use std::fmt;

use quill_core::error::AppError;

/// Lifecycle state of a managed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Not connected and not trying to be. Terminal after logout.
    Disconnected,
    /// Handshake or backoff in progress.
    Connecting,
    /// Live.
    Connected,
    /// Gave up; waits for a manual reconnect or a rename.
    Error,
}

impl ConnectionState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connecting)
                | (Connecting, Connected)
                | (Connecting, Error)
                | (Connected, Connecting)
                | (Connected, Connected)
                | (Error, Connecting)
                | (Error, Connected)
                | (_, Disconnected)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Snapshot published on the status channel.
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    /// Current state.
    pub state: ConnectionState,
    /// Reconnect attempts since the last successful connection.
    pub attempt: u32,
    /// Why the connection last failed, if it did.
    pub last_error: Option<AppError>,
}

impl ConnectionStatus {
    pub(crate) fn new(state: ConnectionState) -> Self {
        Self {
            state,
            attempt: 0,
            last_error: None,
        }
    }
}
