//! Error handling module
//!
//! Provides unified error types and handling for the entire crate.

use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Rejected by service: {0}")]
    Rejected(String),

    #[error("Incomplete response: {0}")]
    IncompleteResponse(String),

    #[error("Preference storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for crate operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Helper function to create a rejection error
pub fn rejected(msg: impl Into<String>) -> AuthError {
    AuthError::Rejected(msg.into())
}

/// Helper function to create an incomplete-response error
pub fn incomplete(msg: impl Into<String>) -> AuthError {
    AuthError::IncompleteResponse(msg.into())
}
