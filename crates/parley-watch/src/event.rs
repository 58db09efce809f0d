//! Events emitted by the watcher.

use parley_core::MessageRecord;

/// Classification of one mutation batch.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// The visible conversation was replaced. At most one per batch, always
    /// ahead of the batch's messages.
    ConversationChanged,
    /// A message appeared in an added subtree.
    NewMessage(MessageRecord),
}

impl WatchEvent {
    pub fn is_conversation_change(&self) -> bool {
        matches!(self, WatchEvent::ConversationChanged)
    }
}
