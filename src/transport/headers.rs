//! Header utilities for backend requests
//!
//! Authentication and tenant scoping are attached here so every request the
//! client makes carries the same identity.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::warn;

use crate::config::Config;

/// Header carrying the tenant scope
pub const TENANT_HEADER: HeaderName = HeaderName::from_static("x-tenant-id");

/// Build default headers for JSON requests to the backend
///
/// A token or tenant id that is not a valid header value is skipped with a
/// warning rather than failing every request.
pub fn build_default_headers(config: &Config) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = &config.api_token {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("ASSISTANT_API_TOKEN is not a valid header value, sending no Authorization"),
        }
    }

    if let Some(tenant_id) = &config.tenant_id {
        match HeaderValue::from_str(tenant_id) {
            Ok(value) => {
                headers.insert(TENANT_HEADER, value);
            }
            Err(_) => warn!(tenant_id = %tenant_id, "Tenant id is not a valid header value, skipping"),
        }
    }

    headers
}

/// Build headers for a streaming request (adds `Accept: text/event-stream`)
pub fn build_stream_headers(config: &Config) -> HeaderMap {
    let mut headers = build_default_headers(config);
    headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
    headers
}
