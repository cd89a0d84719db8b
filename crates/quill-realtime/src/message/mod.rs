//! Inbound frame decoding and content validation.

pub mod codec;
pub mod validator;

pub use codec::{decode, encode};
pub use validator::{MessageContent, validate_frame_size};
