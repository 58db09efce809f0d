//! # Parley Watch
//!
//! Page-level control for parley.
//!
//! - [`MessageWatcher`]: turns mutation batches into [`WatchEvent`]s
//! - [`SwitchCoordinator`]: pauses, clears, reapplies and resumes the queue
//!   around conversation switches
//! - [`Session`]: ties both to the translation queue

pub mod coordinator;
pub mod error;
pub mod event;
pub mod session;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use coordinator::{SwitchCoordinator, SwitchPhase};
pub use error::WatchError;
pub use event::WatchEvent;
pub use session::{Session, SessionStatus};
pub use watcher::MessageWatcher;
