//! Notification pull and callback subscription handlers

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bytes::Bytes;
use lwgate_core::{CallbackSubscription, NotificationBatch};

use super::{parse_json, require_json};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /notifications/pull
///
/// Drains the journal. Always succeeds, possibly with empty collections.
pub async fn pull(State(state): State<AppState>) -> Json<NotificationBatch> {
    Json(state.gateway().drain_all())
}

/// GET /notifications/callback
pub async fn get_callback(
    State(state): State<AppState>,
) -> Result<Json<CallbackSubscription>, ApiError> {
    state
        .gateway()
        .subscription()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No callback subscription".to_string()))
}

/// PUT /notifications/callback
///
/// The callback is probed before it replaces the current subscription.
pub async fn put_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    require_json(&headers)?;
    let value = parse_json(&body)?;
    let subscription = CallbackSubscription::from_json(&value)?;

    state
        .gateway()
        .set_subscription(subscription, state.sender())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /notifications/callback
pub async fn delete_callback(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.gateway().clear_subscription()?;
    Ok(StatusCode::NO_CONTENT)
}
