//! Watcher errors.

use parley_dom::DomError;
use thiserror::Error;

/// Watcher error types.
#[derive(Debug, Error)]
pub enum WatchError {
    /// No element matches the app root selectors.
    #[error("App root not found")]
    RootNotFound,

    /// The host refused the subscription.
    #[error("Failed to observe app root: {0}")]
    Observe(#[from] DomError),
}
