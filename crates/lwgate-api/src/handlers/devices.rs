//! Device credential handlers
//!
//! Only public views (`uuid`, `psk_id`) leave the gateway; the key itself is
//! write-only over REST.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bytes::Bytes;
use lwgate_creds::PublicView;

use super::{parse_json, require_json};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /devices
pub async fn list_devices(State(state): State<AppState>) -> Json<Vec<PublicView>> {
    Json(state.gateway().list_devices())
}

/// POST /devices
pub async fn create_device(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<PublicView>), ApiError> {
    require_json(&headers)?;
    let value = parse_json(&body)?;
    let view = state.gateway().add_device(&value)?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /devices/{uuid}
pub async fn get_device(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<Json<PublicView>, ApiError> {
    Ok(Json(state.gateway().get_device(&uuid)?))
}

/// PUT /devices/{uuid}
pub async fn update_device(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    require_json(&headers)?;
    let value = parse_json(&body)?;
    state.gateway().update_device(&uuid, &value)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /devices/{uuid}
pub async fn delete_device(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.gateway().delete_device(&uuid)?;
    Ok(StatusCode::NO_CONTENT)
}
