//! # quill-client
//!
//! Client side of the Quill hub: a reconnecting connection manager with
//! exponential backoff and ping/pong liveness, the pen name rename flow,
//! a typing debouncer, and notification presentation.

pub mod backoff;
pub mod chat;
pub mod manager;
pub mod notifications;
pub mod presenter;
pub mod rename;
pub mod state;
pub mod transport;
pub mod typing;

pub use backoff::Backoff;
pub use chat::ChatClient;
pub use manager::{Channel, ConnectionManager, ManagerHandle, ServerFrame};
pub use notifications::NotificationClient;
pub use presenter::{NotificationPresenter, Presentation};
pub use rename::{Availability, AvailabilityCheck, HttpAvailability};
pub use state::{ConnectionState, ConnectionStatus};
pub use transport::{Connector, Endpoint, Transport, WsConnector};
pub use typing::TypingDebouncer;
