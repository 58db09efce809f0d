//! Translation annotations on message elements.

use std::sync::Arc;

use parley_core::markers::{ANNOTATION_CLASS, ANNOTATION_PREFIX, MARKER_VALUE, TRANSLATED_ATTR};
use parley_core::MessageExtractor;
use parley_dom::{HostDocument, NodeId, NodeSpec};
use tracing::{debug, info, warn};

use crate::error::QueueError;

/// Where translation results go.
pub trait TranslationDisplay: Send + Sync {
    /// Show `translated` on message element `node`, replacing any annotation
    /// already there.
    fn display(&self, node: NodeId, translated: &str) -> Result<(), QueueError>;

    /// Remove every annotation. Returns how many were removed.
    fn clear_all(&self) -> usize;

    /// Messages marked as translated that currently show no annotation,
    /// with their current text.
    fn pending_reapply(&self) -> Vec<(NodeId, String)>;
}

/// Injects annotation elements into the host document.
pub struct DomAnnotator {
    doc: Arc<dyn HostDocument>,
    extractor: MessageExtractor,
}

impl DomAnnotator {
    pub fn new(doc: Arc<dyn HostDocument>, extractor: MessageExtractor) -> Self {
        Self { doc, extractor }
    }

    fn is_annotation(&self, node: NodeId) -> bool {
        has_class(self.doc.as_ref(), node, ANNOTATION_CLASS)
    }

    fn annotations_under(&self, root: NodeId) -> Vec<NodeId> {
        self.doc
            .descendants(root)
            .into_iter()
            .filter(|node| self.is_annotation(*node))
            .collect()
    }

    /// Parent of the nearest `.copyable-text` wrapper of the text element,
    /// or the text element's own parent.
    fn insert_target(&self, message: NodeId) -> Option<NodeId> {
        let doc = self.doc.as_ref();
        let text_element = self.extractor.text_element(doc, message)?;

        let mut current = Some(text_element);
        while let Some(node) = current {
            if has_class(doc, node, "copyable-text") {
                if let Some(parent) = doc.parent(node) {
                    return Some(parent);
                }
            }
            if node == message {
                break;
            }
            current = doc.parent(node);
        }
        doc.parent(text_element)
    }
}

impl TranslationDisplay for DomAnnotator {
    fn display(&self, node: NodeId, translated: &str) -> Result<(), QueueError> {
        let doc = self.doc.as_ref();
        if !doc.is_connected(node) {
            return Err(QueueError::Detached(node));
        }

        for existing in self.annotations_under(node) {
            doc.remove_node(existing);
        }

        let target = self
            .insert_target(node)
            .ok_or(QueueError::NoInsertPoint(node))?;
        let annotation = NodeSpec::element("div")
            .class(ANNOTATION_CLASS)
            .text(format!("{}{}", ANNOTATION_PREFIX, translated));
        doc.append_element(target, &annotation)
            .ok_or(QueueError::Detached(target))?;
        doc.set_attribute(node, TRANSLATED_ATTR, MARKER_VALUE);

        debug!("Annotation shown on {}", node);
        Ok(())
    }

    fn clear_all(&self) -> usize {
        let annotations = self.annotations_under(self.doc.root());
        for node in &annotations {
            self.doc.remove_node(*node);
        }
        info!("Removed {} translation annotations", annotations.len());
        annotations.len()
    }

    fn pending_reapply(&self) -> Vec<(NodeId, String)> {
        let doc = self.doc.as_ref();
        doc.descendants(doc.root())
            .into_iter()
            .filter(|node| doc.attribute(*node, TRANSLATED_ATTR).as_deref() == Some(MARKER_VALUE))
            .filter(|node| self.annotations_under(*node).is_empty())
            .filter_map(|node| {
                let text = self.extractor.text_of(doc, node);
                if text.is_empty() {
                    warn!("Translated message {} has no text left", node);
                    None
                } else {
                    Some((node, text))
                }
            })
            .collect()
    }
}

fn has_class(doc: &dyn HostDocument, node: NodeId, class: &str) -> bool {
    doc.attribute(node, "class")
        .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
