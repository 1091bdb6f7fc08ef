//! Error types for the application

use thiserror::Error;

/// Result type alias using our TraderError
pub type Result<T> = std::result::Result<T, TraderError>;

/// Error type for collaborator operations
///
/// The decision core never returns these to its caller. They travel between
/// the decision sources / balance providers and the engine, which absorbs
/// them into a conservative decision.
#[derive(Error, Debug)]
pub enum TraderError {
    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// JSON-RPC error object returned by the node
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Model reply did not follow ACTION|TOKEN|CONFIDENCE|REASONING
    #[error("Unparseable model reply: {0}")]
    ModelReply(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// No decision source configured, or the source refused to answer
    #[error("Decision source unavailable: {0}")]
    SourceUnavailable(String),
}

impl From<tokio::time::error::Elapsed> for TraderError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        TraderError::Timeout(err.to_string())
    }
}
