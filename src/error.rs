//! Error handling and custom error types
//!
//! Provides unified error handling across the relay using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    /// Non-success status returned by the upstream API.
    #[error("{message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("No image data received from API")]
    MissingImage,
}

impl Error {
    /// Whether the relay may absorb this error and try the upstream again.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Error::Validation(_) | Error::PayloadTooLarge(_) | Error::Config(_) | Error::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
