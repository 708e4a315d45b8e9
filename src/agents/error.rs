//! Error types for the conversation agent

use thiserror::Error;

use crate::devices::RegistryError;

/// Errors that can end a turn before a reply is interpreted
#[derive(Debug, Error)]
pub enum AgentError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Device registry error
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors specific to the chat-completion API
#[derive(Debug, Error)]
pub enum LlmError {
    /// Non-success HTTP status, carrying the raw response body
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Authentication error
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Timeout
    #[error("Request timed out")]
    Timeout,
}

/// Failures while obtaining an image; never surfaced to the user
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image fetch returned HTTP {0}")]
    Status(u16),

    #[error("Image larger than {0} bytes")]
    TooLarge(u64),

    #[error("Image fetch failed: {0}")]
    Fetch(String),

    #[error("Image file not found: {0}")]
    NotFound(String),

    #[error("Image read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Camera capture failed: {0}")]
    Capture(#[from] RegistryError),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::Network(format!("Connection error: {}", err))
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<reqwest::Error> for ImageError {
    fn from(err: reqwest::Error) -> Self {
        ImageError::Fetch(err.to_string())
    }
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Result type alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;
