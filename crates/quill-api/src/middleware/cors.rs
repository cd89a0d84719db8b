//! CORS for the browser chat and notification clients.

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use quill_core::config::CorsConfig;

/// Build the CORS layer. Entries that fail to parse are skipped with a warning.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origin(&config.allowed_origins))
        .allow_methods(parse_all::<Method>(&config.allowed_methods, "method"))
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age_seconds))
}

fn allowed_origin(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(parse_all::<HeaderValue>(origins, "origin"))
    }
}

fn parse_all<T: std::str::FromStr>(values: &[String], what: &str) -> Vec<T> {
    values
        .iter()
        .filter_map(|v| match v.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!(value = %v, kind = what, "Ignoring invalid CORS entry");
                None
            }
        })
        .collect()
}
