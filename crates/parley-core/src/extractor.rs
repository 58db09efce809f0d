//! Message discovery.

use std::sync::Arc;

use parley_dom::{HostDocument, NodeId};
use tracing::debug;

use crate::markers::{MARKER_VALUE, PROCESSED_ATTR};
use crate::record::MessageRecord;
use crate::selectors::HostSelectors;

/// Finds message elements under a root and reads their text.
///
/// Apart from the `data-processed` marker written by [`MessageExtractor::scan`]
/// the extractor holds no state.
#[derive(Debug, Clone)]
pub struct MessageExtractor {
    selectors: Arc<HostSelectors>,
}

impl MessageExtractor {
    pub fn new(selectors: Arc<HostSelectors>) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &HostSelectors {
        &self.selectors
    }

    /// One record per message element under `root` (inclusive), in document
    /// order. Media-only messages yield an empty text.
    pub fn extract<D: HostDocument + ?Sized>(&self, doc: &D, root: NodeId) -> Vec<MessageRecord> {
        self.message_elements(doc, root)
            .into_iter()
            .map(|node| MessageRecord::new(node, &self.text_of(doc, node)))
            .collect()
    }

    /// Like [`MessageExtractor::extract`], but skips elements already marked
    /// as processed and marks every element with text it returns.
    pub fn scan<D: HostDocument + ?Sized>(&self, doc: &D, root: NodeId) -> Vec<MessageRecord> {
        let records: Vec<MessageRecord> = self
            .message_elements(doc, root)
            .into_iter()
            .filter(|node| !self.is_processed(doc, *node))
            .map(|node| MessageRecord::new(node, &self.text_of(doc, node)))
            .filter(|record| !record.is_empty())
            .collect();

        for record in &records {
            doc.set_attribute(record.node, PROCESSED_ATTR, MARKER_VALUE);
        }

        debug!("Scan under {} found {} unprocessed messages", root, records.len());
        records
    }

    /// Clear every processed marker under `root` (inclusive). Returns how many were cleared.
    pub fn reset_markers<D: HostDocument + ?Sized>(&self, doc: &D, root: NodeId) -> usize {
        let mut cleared = 0;
        let candidates = std::iter::once(root).chain(doc.descendants(root));
        for node in candidates {
            if doc.attribute(node, PROCESSED_ATTR).is_some() {
                doc.remove_attribute(node, PROCESSED_ATTR);
                cleared += 1;
            }
        }

        debug!("Cleared {} processed markers", cleared);
        cleared
    }

    /// Trimmed text of the first text-bearing descendant, trying each text
    /// selector in priority order. Empty when none has text.
    pub fn text_of<D: HostDocument + ?Sized>(&self, doc: &D, message: NodeId) -> String {
        self.text_element(doc, message)
            .and_then(|node| doc.text_content(node))
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }

    /// The text-bearing descendant [`MessageExtractor::text_of`] reads from.
    pub fn text_element<D: HostDocument + ?Sized>(&self, doc: &D, message: NodeId) -> Option<NodeId> {
        self.selectors.text.alternatives().iter().find_map(|selector| {
            doc.query_first(message, selector).filter(|node| {
                doc.text_content(*node)
                    .is_some_and(|text| !text.trim().is_empty())
            })
        })
    }

    /// Whether `node` marks a conversation view.
    pub fn is_conversation_root<D: HostDocument + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        self.selectors.conversation_roots.matches(doc, node)
    }

    /// Container holding the visible conversation's messages.
    pub fn message_container<D: HostDocument + ?Sized>(&self, doc: &D) -> Option<NodeId> {
        self.selectors.containers.find_first_inclusive(doc, doc.root())
    }

    /// Root the mutation watcher subscribes to.
    pub fn app_root<D: HostDocument + ?Sized>(&self, doc: &D) -> Option<NodeId> {
        self.selectors.app_root.find_first_inclusive(doc, doc.root())
    }

    pub fn is_processed<D: HostDocument + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        doc.attribute(node, PROCESSED_ATTR).as_deref() == Some(MARKER_VALUE)
    }

    /// Outermost message elements under `root` (inclusive), in document order.
    ///
    /// A message element nested in another one belongs to it.
    fn message_elements<D: HostDocument + ?Sized>(&self, doc: &D, root: NodeId) -> Vec<NodeId> {
        let mut outer: Vec<NodeId> = Vec::new();
        for node in self.selectors.messages.query_all_inclusive(doc, root) {
            if !outer.iter().any(|kept| doc.contains(*kept, node)) {
                outer.push(node);
            }
        }
        outer
    }
}

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
