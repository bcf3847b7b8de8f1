//! API error types and conversions

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lwgate_core::GatewayError;
use serde::Serialize;

/// API error type that converts to HTTP responses
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request
    BadRequest(String),
    /// 404 Not Found
    NotFound(String),
    /// 405 Method Not Allowed
    MethodNotAllowed(String),
    /// 410 Gone (device not registered)
    Gone(String),
    /// 415 Unsupported Media Type
    UnsupportedMediaType(String),
    /// 500 Internal Server Error
    Internal(String),
}

/// Standard error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Gone(_) => StatusCode::GONE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg),
            ApiError::NotFound(msg) => ("not_found", msg),
            ApiError::MethodNotAllowed(msg) => ("method_not_allowed", msg),
            ApiError::Gone(msg) => ("gone", msg),
            ApiError::UnsupportedMediaType(msg) => ("unsupported_media_type", msg),
            ApiError::Internal(msg) => ("internal_error", msg),
        };

        if status.is_server_error() {
            tracing::error!(error = error_type, %message, "API error");
        } else {
            tracing::debug!(error = error_type, %message, "API client error");
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status = err.status_code();
        let message = err.to_string();
        match err {
            GatewayError::MethodNotAllowed(_) => ApiError::MethodNotAllowed(message),
            GatewayError::UnsupportedMediaType(_) => ApiError::UnsupportedMediaType(message),
            GatewayError::DeviceGone(_) => ApiError::Gone(message),
            GatewayError::BadRequest(_) | GatewayError::CallbackUnreachable(_) => {
                ApiError::BadRequest(message)
            }
            GatewayError::InvalidPath(_) | GatewayError::NotFound(_) => ApiError::NotFound(message),
            GatewayError::DispatchFailed(_) | GatewayError::Internal(_) => {
                ApiError::Internal(message)
            }
            GatewayError::Credential(_) => match status {
                400 => ApiError::BadRequest(message),
                404 => ApiError::NotFound(message),
                _ => ApiError::Internal(message),
            },
        }
    }
}
