//! DOM boundary errors.

use thiserror::Error;

use crate::document::NodeId;

/// DOM boundary error types.
#[derive(Debug, Error)]
pub enum DomError {
    /// Selector text could not be parsed.
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// The element is no longer attached to the document.
    #[error("Node {0} is detached")]
    Detached(NodeId),

    /// No element matched any of the selectors.
    #[error("No element matches: {0}")]
    NoMatch(String),

    /// Document description could not be decoded.
    #[error("Invalid document description: {0}")]
    InvalidSpec(#[from] serde_json::Error),
}
