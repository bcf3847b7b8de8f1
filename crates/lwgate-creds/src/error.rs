//! Credential store errors

use thiserror::Error;

/// Result type for credential store operations
pub type CredentialResult<T> = Result<T, CredentialError>;

/// Errors raised while validating, loading or persisting credentials
#[derive(Debug, Error)]
pub enum CredentialError {
    /// JSON entry does not have the required shape
    #[error("Invalid credential entry: {0}")]
    InvalidEntry(String),

    /// No record with the given identifier
    #[error("Device not found: {0}")]
    NotFound(String),

    /// Database file is valid JSON but not an array
    #[error("Devices database must contain a JSON array")]
    NotAnArray,

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CredentialError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CredentialError::InvalidEntry(_) => 400,
            CredentialError::NotFound(_) => 404,
            CredentialError::NotAnArray => 500,
            CredentialError::Io(_) => 500,
            CredentialError::Json(_) => 500,
        }
    }
}
