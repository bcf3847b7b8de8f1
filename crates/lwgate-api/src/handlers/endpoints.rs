//! Device endpoint handlers
//!
//! `GET`, `PUT` and `POST` on a resource path start an asynchronous read,
//! write or execute. The reply is delivered later through the notification
//! journal under the returned `async-response-id`.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::Json;
use bytes::Bytes;
use lwgate_core::InboundRequest;
use serde::Serialize;
use tracing::debug;

use super::content_type;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of a `202 Accepted` operation response
#[derive(Debug, Serialize)]
pub struct AsyncResponseId {
    #[serde(rename = "async-response-id")]
    pub id: String,
}

/// Registered endpoint summary
#[derive(Debug, Serialize)]
pub struct EndpointSummary {
    pub name: String,
    pub status: &'static str,
    pub q: bool,
}

/// GET /endpoints
pub async fn list_endpoints(State(state): State<AppState>) -> Json<Vec<EndpointSummary>> {
    let endpoints = state
        .gateway()
        .list_clients()
        .into_iter()
        .map(|client| EndpointSummary {
            name: client.name,
            status: "ACTIVE",
            q: false,
        })
        .collect();

    Json(endpoints)
}

/// ANY /endpoints/{name}/{*path}
pub async fn resource_operation(
    State(state): State<AppState>,
    Path((name, path)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<AsyncResponseId>), ApiError> {
    let path = format!("/{}", path);
    debug!(device = %name, path = %path, method = %method, "Endpoint request");

    let content_type = content_type(&headers);
    let id = state.gateway().submit(InboundRequest {
        method: method.as_str(),
        device: &name,
        path: &path,
        content_type: content_type.as_deref(),
        body,
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(AsyncResponseId { id: id.to_string() }),
    ))
}
