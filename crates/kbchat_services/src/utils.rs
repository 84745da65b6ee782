use std::fmt::Display;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

/// Copy of `headers` that is safe to log.
pub(crate) fn sanitize_headers(headers: &HeaderMap) -> HeaderMap {
    let mut sanitized = headers.clone();
    if sanitized.contains_key(AUTHORIZATION) {
        sanitized.insert(AUTHORIZATION, HeaderValue::from_static("[REDACTED]"));
    }
    sanitized
}

pub(crate) fn format_http_context<U: Display>(
    status: Option<StatusCode>,
    method: &str,
    url: U,
) -> String {
    match status {
        Some(status) => format!("{status} {method} {url}"),
        None => format!("{method} {url}"),
    }
}
