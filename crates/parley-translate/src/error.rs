//! Translation errors.

use thiserror::Error;

/// Remote translation error types.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Request could not be sent or the body could not be read.
    #[error("Network error: {0}")]
    Network(String),

    /// The attempt exceeded the client-side timeout.
    #[error("Request timed out")]
    Timeout,

    /// Non-success HTTP status.
    #[error("Translate endpoint returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Endpoint URL could not be parsed.
    #[error("Invalid endpoint '{0}'")]
    InvalidEndpoint(String),
}

impl From<reqwest::Error> for TranslateError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranslateError::Timeout
        } else {
            TranslateError::Network(e.to_string())
        }
    }
}
