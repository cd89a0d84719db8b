//! # quill-realtime
//!
//! Real-time engine for the Quill forum hub. Provides:
//!
//! - Pen name reservation bound to live chat sessions
//! - An ordered chat room with bounded history replay
//! - Typing indicators with expiry
//! - Category-filtered notification fan-out with burst coalescing
//! - Heartbeat sweeps for both channels

pub mod chat;
pub mod connection;
pub mod identity;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod presence;
pub mod server;
pub mod sweeper;

pub use chat::{ChatRegistry, ChatSession, MessageBroadcaster};
pub use identity::{PenNameAllocator, PenNameClaim};
pub use metrics::{MetricsSnapshot, RealtimeMetrics};
pub use notification::{DeliveryReport, EventBridge, EventReport, NotificationHub};
pub use presence::TypingAggregator;
pub use server::{EngineStatus, RealtimeEngine};
