//! Core errors.

use parley_dom::DomError;
use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A configured selector failed to parse.
    #[error("Invalid selector in '{field}': {source}")]
    Selector {
        field: &'static str,
        #[source]
        source: DomError,
    },
}
