//! Error types for Quill
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Quill
#[derive(Debug, Error)]
pub enum QuillError {
    /// Missing or placeholder credentials - fatal before the run loop starts
    #[error("Configuration error: {0}")]
    Config(String),

    /// The completion endpoint returned a non-success status
    #[error("API error {status}: {body}")]
    Request { status: u16, body: String },

    /// The transport delivered no readable response body
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Quill operations
pub type Result<T> = std::result::Result<T, QuillError>;
