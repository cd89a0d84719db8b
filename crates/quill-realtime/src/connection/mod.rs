//! Connection lifecycle primitives shared by the chat and notification registries.

pub mod handle;
pub mod heartbeat;
pub mod pool;

pub use handle::{ConnectionHandle, Delivery};
pub use heartbeat::HeartbeatPolicy;
pub use pool::ConnectionPool;
