//! Queue items.

use chrono::{DateTime, Utc};
use parley_core::MessageRecord;

/// A pending translation request.
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub record: MessageRecord,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn new(record: MessageRecord) -> Self {
        Self {
            record,
            enqueued_at: Utc::now(),
        }
    }
}

/// What happened to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Shown from a freshly computed or cached translation.
    Displayed,
    /// Shown from history without touching the cache or the remote call.
    FromHistory,
    /// Empty result or identical to the source; nothing shown.
    Unchanged,
    /// Nothing to translate.
    Skipped,
    /// Translated, but the element was gone by the time it came back.
    Stale,
}
