//! Per-connection chat state.

use std::sync::Mutex;

use quill_core::protocol::ChatServerFrame;
use quill_core::types::PenName;

use crate::connection::ConnectionHandle;
use crate::identity::PenNameClaim;

/// A connection on the chat channel.
pub type ChatSession = ConnectionHandle<ChatServerFrame, ChatIdentity>;

/// Identity bound to a chat session for its whole lifetime.
#[derive(Debug)]
pub struct ChatIdentity {
    /// Pen name the session was admitted under.
    pub pen_name: PenName,
    claim: Mutex<Option<PenNameClaim>>,
}

impl ChatIdentity {
    /// Bind a reserved name to a new session.
    pub fn new(claim: PenNameClaim) -> Self {
        Self {
            pen_name: claim.name().clone(),
            claim: Mutex::new(Some(claim)),
        }
    }

    /// Free the pen name. Only the first call has an effect.
    pub fn release(&self) -> bool {
        let claim = self
            .claim
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        claim.map(PenNameClaim::release).unwrap_or(false)
    }
}
