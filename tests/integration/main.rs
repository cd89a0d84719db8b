//! Integration tests for the Quill hub.

mod helpers;

mod api_test;
mod chat_test;
mod client_test;
mod notification_test;
