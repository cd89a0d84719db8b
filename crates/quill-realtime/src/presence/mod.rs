//! Presence: who is typing right now.

pub mod typing;

pub use typing::TypingAggregator;
