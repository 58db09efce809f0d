//! Observed messages.

use chrono::{DateTime, Utc};
use parley_dom::NodeId;

use crate::fingerprint::{self, Fingerprint};

/// One observation of a chat message.
///
/// Records are never updated. Observing the same element again produces a
/// new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub fingerprint: Fingerprint,
    /// Trimmed display text; empty for media-only messages.
    pub text: String,
    /// The live element. May stop being connected at any time.
    pub node: NodeId,
    pub observed_at: DateTime<Utc>,
}

impl MessageRecord {
    pub fn new(node: NodeId, text: &str) -> Self {
        let observed_at = Utc::now();
        let text = fingerprint::normalize(text).to_string();
        Self {
            fingerprint: Fingerprint::new(&text, observed_at),
            text,
            node,
            observed_at,
        }
    }

    /// Stable key under which this message's translation is recorded.
    pub fn history_key(&self) -> String {
        fingerprint::history_key(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
