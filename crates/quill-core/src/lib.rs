//! # quill-core
//!
//! Core crate for the Quill realtime hub. Contains configuration schemas,
//! the wire protocol shared by server and client, forum domain events,
//! typed identifiers, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Quill crates.

pub mod config;
pub mod error;
pub mod events;
pub mod protocol;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
