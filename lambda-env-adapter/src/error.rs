//! Error types for the event adapter.

use thiserror::Error;

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Errors raised while translating an event or running the application.
///
/// None of these are turned into HTTP responses here; the Lambda host
/// reports them as a failed invocation.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("malformed event: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    #[error("request body is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("application failed: {0:#}")]
    Application(anyhow::Error),

    #[error("failed to read response body: {0:#}")]
    Body(anyhow::Error),
}
