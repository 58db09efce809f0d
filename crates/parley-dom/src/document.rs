//! The host document contract.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::DomError;
use crate::node_spec::NodeSpec;
use crate::selector::SelectorList;

/// Non-owning handle to a node of the host document.
///
/// Handles are never reused. Once the host removes or re-renders a subtree,
/// its handles stop being connected and every operation through them is a
/// no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Children were added or removed.
    ChildList,
    /// Text content was replaced.
    CharacterData,
}

/// One structural change observed under a watched root.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    /// Node whose children changed.
    pub target: NodeId,
    pub kind: MutationKind,
    /// Roots of the added subtrees.
    pub added: Vec<NodeId>,
    /// Roots of the removed subtrees (already detached).
    pub removed: Vec<NodeId>,
}

/// Records delivered together. Batches are coalesced by the host; one logical
/// change may span several records and several changes may share a batch.
pub type MutationBatch = Vec<MutationRecord>;

/// Receiving end of a mutation subscription. The stream ends when the watched
/// root leaves the document.
pub type MutationStream = mpsc::UnboundedReceiver<MutationBatch>;

/// Primitives the pipeline needs from a document it does not own.
///
/// Implementations only provide the structural primitives; queries are
/// derived from them.
pub trait HostDocument: Send + Sync {
    /// The document element.
    fn root(&self) -> NodeId;

    /// Whether the node is still attached to the document.
    fn is_connected(&self, node: NodeId) -> bool;

    /// Lowercase tag name; `None` for text nodes and detached handles.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Returns `false` when the node is detached.
    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> bool;

    /// Returns `false` when the node is detached.
    fn remove_attribute(&self, node: NodeId, name: &str) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Child nodes, text nodes included, in order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Concatenated text of all descendant text nodes; `None` when detached.
    fn text_content(&self, node: NodeId) -> Option<String>;

    /// Replace all children with a single text node.
    fn set_text_content(&self, node: NodeId, text: &str) -> bool;

    /// Build `spec` and append it as the last child of `parent`.
    fn append_element(&self, parent: NodeId, spec: &NodeSpec) -> Option<NodeId>;

    /// Detach a node and its subtree.
    fn remove_node(&self, node: NodeId) -> bool;

    /// Subscribe to batched child-list and text changes anywhere under `root`.
    fn observe(&self, root: NodeId) -> Result<MutationStream, DomError>;

    /// Whether `node` matches `selector`.
    fn matches(&self, node: NodeId, selector: &SelectorList) -> bool {
        selector.matches(self, node)
    }

    /// Element descendants of `root` (exclusive) in document order.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if self.tag_name(node).is_none() {
                continue;
            }
            out.push(node);
            stack.extend(self.children(node).into_iter().rev());
        }
        out
    }

    /// All matching descendants of `root` (exclusive) in document order.
    fn query_all(&self, root: NodeId, selector: &SelectorList) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|node| selector.matches(self, *node))
            .collect()
    }

    /// First matching descendant of `root` in document order.
    fn query_first(&self, root: NodeId, selector: &SelectorList) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|node| selector.matches(self, *node))
    }

    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, node: NodeId, selector: &SelectorList) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if selector.matches(self, candidate) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.parent(candidate);
        }
        false
    }
}
