//! Common error types for the gateway core

use lwgate_creds::CredentialError;
use thiserror::Error;

use crate::engine::EngineError;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur in the gateway core
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP verb has no device operation
    #[error("Method not supported: {0}")]
    MethodNotAllowed(String),

    /// Content-Type missing or not mappable to a device content format
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Malformed client input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Device is not currently registered
    #[error("Device gone: {0}")]
    DeviceGone(String),

    /// Resource path could not be parsed
    #[error("Invalid resource path: {0}")]
    InvalidPath(String),

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Callback URL did not answer the liveness probe
    #[error("Callback unreachable: {0}")]
    CallbackUnreachable(String),

    /// The protocol engine refused to dispatch the operation
    #[error("Dispatch failed: {0}")]
    DispatchFailed(String),

    /// Credential store error
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::MethodNotAllowed(_) => 405,
            GatewayError::UnsupportedMediaType(_) => 415,
            GatewayError::BadRequest(_) => 400,
            GatewayError::DeviceGone(_) => 410,
            GatewayError::InvalidPath(_) => 404,
            GatewayError::NotFound(_) => 404,
            GatewayError::CallbackUnreachable(_) => 400,
            GatewayError::DispatchFailed(_) => 500,
            GatewayError::Credential(e) => e.status_code(),
            GatewayError::Internal(_) => 500,
        }
    }
}

impl From<EngineError> for GatewayError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::UnknownClient(_) => GatewayError::DeviceGone(err.to_string()),
            EngineError::Exhausted => GatewayError::Internal(err.to_string()),
            other => GatewayError::DispatchFailed(other.to_string()),
        }
    }
}
