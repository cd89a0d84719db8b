//! Pen name identity: the live-session name set.

pub mod allocator;

pub use allocator::{PenNameAllocator, PenNameClaim};
