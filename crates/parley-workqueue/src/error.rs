//! Queue errors.

use parley_dom::NodeId;
use parley_translate::TranslateError;
use thiserror::Error;

/// Queue error types.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The remote call failed.
    #[error("Translation failed: {0}")]
    Translate(#[from] TranslateError),

    /// The element left the document before the result could be applied.
    #[error("Element {0} is no longer attached")]
    Detached(NodeId),

    /// No place to put the annotation inside the message element.
    #[error("No insertion point inside message {0}")]
    NoInsertPoint(NodeId),
}
