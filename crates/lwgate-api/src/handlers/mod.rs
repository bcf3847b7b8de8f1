//! HTTP request handlers for the gateway API

pub mod devices;
pub mod endpoints;
pub mod notifications;

use std::borrow::Cow;

use axum::http::{header, HeaderMap};

use crate::error::ApiError;

const APPLICATION_JSON: &str = "application/json";

/// `Content-Type` of a request, if present.
///
/// Invalid UTF-8 is replaced, so a header that is not plain ASCII
/// never matches a known media type and is not mistaken for a missing one.
pub(crate) fn content_type(headers: &HeaderMap) -> Option<Cow<'_, str>> {
    headers
        .get(header::CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
}

/// Reject bodies that are not declared as JSON
pub(crate) fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let content_type = content_type(headers);
    let media_type = content_type
        .as_deref()
        .and_then(|ct| ct.split(';').next())
        .map(str::trim);

    match media_type {
        Some(mt) if mt.eq_ignore_ascii_case(APPLICATION_JSON) => Ok(()),
        Some(other) => Err(ApiError::UnsupportedMediaType(format!(
            "expected {}, got {}",
            APPLICATION_JSON, other
        ))),
        None => Err(ApiError::UnsupportedMediaType(format!(
            "expected {}",
            APPLICATION_JSON
        ))),
    }
}

/// Parse a JSON request body into a generic value
pub(crate) fn parse_json(body: &[u8]) -> Result<serde_json::Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {}", e)))
}
