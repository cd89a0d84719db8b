//! Client-side typing debounce.
//!
//! The first keystroke of a run sends `typingStart`. Every keystroke re-arms
//! a stop timer; when it fires, `typingStop` is sent. Sending a message
//! disarms the timer without a stop, since the hub emits one for the send.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use quill_core::protocol::ChatClientFrame;
use quill_core::result::AppResult;

use crate::manager::ManagerHandle;

#[derive(Debug, Default)]
struct TimerState {
    armed: Option<CancellationToken>,
    generation: u64,
}

/// Turns keystrokes into `typingStart`/`typingStop` frames.
#[derive(Debug, Clone)]
pub struct TypingDebouncer {
    handle: ManagerHandle,
    delay: Duration,
    state: Arc<Mutex<TimerState>>,
}

impl TypingDebouncer {
    /// Create a debouncer sending through `handle`, stopping after `delay`
    /// without keystrokes.
    pub fn new(handle: ManagerHandle, delay: Duration) -> Self {
        Self {
            handle,
            delay,
            state: Arc::new(Mutex::new(TimerState::default())),
        }
    }

    /// Record a keystroke.
    pub async fn keystroke(&self) -> AppResult<()> {
        let mut state = self.state.lock().await;
        match state.armed.take() {
            Some(timer) => timer.cancel(),
            None => self.handle.send(&ChatClientFrame::TypingStart).await?,
        }

        let timer = CancellationToken::new();
        state.generation += 1;
        state.armed = Some(timer.clone());
        tokio::spawn(stop_after(
            self.handle.clone(),
            self.state.clone(),
            self.delay,
            state.generation,
            timer,
        ));
        Ok(())
    }

    /// Disarm after a message was sent.
    pub async fn message_sent(&self) {
        if let Some(timer) = self.state.lock().await.armed.take() {
            timer.cancel();
        }
    }

    /// Whether a stop is pending.
    pub async fn is_typing(&self) -> bool {
        self.state.lock().await.armed.is_some()
    }
}

async fn stop_after(
    handle: ManagerHandle,
    state: Arc<Mutex<TimerState>>,
    delay: Duration,
    generation: u64,
    timer: CancellationToken,
) {
    tokio::select! {
        _ = timer.cancelled() => {}
        _ = tokio::time::sleep(delay) => {
            let mut state = state.lock().await;
            if state.generation != generation || state.armed.is_none() {
                return;
            }
            state.armed = None;
            if let Err(err) = handle.send(&ChatClientFrame::TypingStop).await {
                debug!(error = %err, "Could not send typingStop");
            }
        }
    }
}
