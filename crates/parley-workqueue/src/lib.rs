//! # Parley Workqueue
//!
//! Translation work for parley.
//!
//! ## Features
//!
//! - Batched translation queue with high-priority insertion and pause/resume
//! - History, cache and remote lookups per message
//! - Annotation display on the host document, with reapply after re-renders
//! - Serial compose-box translation with transient hints

pub mod display;
pub mod error;
pub mod hint;
pub mod input;
pub mod item;
pub mod queue;

#[cfg(test)]
mod testing;

pub use display::{DomAnnotator, TranslationDisplay};
pub use error::QueueError;
pub use hint::{DomHints, HintKind, HintSink};
pub use input::{InputQueue, InputStatus, KeyAction, KeyPress};
pub use item::{Outcome, QueueItem};
pub use queue::{QueueOptions, QueueStats, QueueStatus, TranslationQueue};
