//! Client error types.

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The descriptor pipeline rejected the rule set or intent.
    #[error(transparent)]
    Build(#[from] waymark::Error),

    /// HTTP request failed. Transport errors pass through untouched.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Response body deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
