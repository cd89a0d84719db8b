//! The chat room: sessions, ordered broadcast, and history.

pub mod broadcaster;
pub mod history;
pub mod registry;
pub mod session;

pub use broadcaster::MessageBroadcaster;
pub use history::HistoryBuffer;
pub use registry::{ChatRegistry, SessionInfo};
pub use session::{ChatIdentity, ChatSession};
