//! In-process host document.

use std::collections::{BTreeMap, HashMap};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::debug;

use crate::document::{
    HostDocument, MutationBatch, MutationKind, MutationRecord, MutationStream, NodeId,
};
use crate::error::DomError;
use crate::node_spec::NodeSpec;
use crate::selector::SelectorList;

#[derive(Debug)]
enum NodeData {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Arena {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
    root: NodeId,
}

impl Arena {
    fn alloc(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                data,
                parent,
                children: Vec::new(),
            },
        );
        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.push(id);
            }
        }
        id
    }

    fn build(&mut self, spec: &NodeSpec, parent: Option<NodeId>) -> NodeId {
        let id = self.alloc(
            NodeData::Element {
                tag: spec.tag.to_ascii_lowercase(),
                attrs: spec.attrs.clone(),
            },
            parent,
        );
        if let Some(text) = &spec.text {
            self.alloc(NodeData::Text(text.clone()), Some(id));
        }
        for child in &spec.children {
            self.build(child, Some(id));
        }
        id
    }

    /// Unlink `node` from its parent and drop the whole subtree.
    fn detach(&mut self, node: NodeId) {
        let parent = self.nodes.get(&node).and_then(|n| n.parent);
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != node);
        }
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.nodes.remove(&id) {
                stack.extend(removed.children);
            }
        }
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(&node) else {
            return;
        };
        match &n.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { .. } => {
                for child in &n.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    fn render(&self, node: NodeId, depth: usize, out: &mut String) {
        let Some(n) = self.nodes.get(&node) else {
            return;
        };
        let indent = "  ".repeat(depth);
        match &n.data {
            NodeData::Text(text) => {
                out.push_str(&format!("{}{:?}\n", indent, text));
            }
            NodeData::Element { tag, attrs } => {
                out.push_str(&indent);
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push_str(&format!(" {}=\"{}\"", name, value));
                }
                out.push_str(">\n");
                for child in &n.children {
                    self.render(*child, depth + 1, out);
                }
            }
        }
    }
}

struct Observer {
    root: NodeId,
    sender: mpsc::UnboundedSender<MutationBatch>,
}

/// A document held in memory.
///
/// Mutations are recorded as they happen and delivered to observers in one
/// batch per [`MemoryDocument::flush`] call, the way a browser coalesces
/// mutation observer callbacks.
pub struct MemoryDocument {
    arena: RwLock<Arena>,
    pending: Mutex<MutationBatch>,
    observers: Mutex<Vec<Observer>>,
}

impl MemoryDocument {
    /// Create a document whose document element is built from `spec`.
    pub fn new(spec: &NodeSpec) -> Self {
        let mut arena = Arena {
            nodes: HashMap::new(),
            next_id: 1,
            root: NodeId(0),
        };
        arena.root = arena.build(spec, None);
        Self {
            arena: RwLock::new(arena),
            pending: Mutex::new(Vec::new()),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Create a document from a JSON [`NodeSpec`].
    pub fn from_json(json: &str) -> Result<Self, DomError> {
        let spec: NodeSpec = serde_json::from_str(json)?;
        Ok(Self::new(&spec))
    }

    /// All elements matching selector text, in document order (root included).
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector = SelectorList::parse(selector)?;
        let root = self.root();
        let mut found = Vec::new();
        if selector.matches(self, root) {
            found.push(root);
        }
        found.extend(self.query_all(root, &selector));
        Ok(found)
    }

    /// First element matching selector text.
    pub fn select_first(&self, selector: &str) -> Result<NodeId, DomError> {
        self.select(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| DomError::NoMatch(selector.to_string()))
    }

    /// Replace every child of `parent`, as a host re-render does.
    pub fn replace_children(&self, parent: NodeId, specs: &[NodeSpec]) -> Vec<NodeId> {
        let mut arena = self.arena.write();
        let Some(old) = arena.nodes.get(&parent).map(|n| n.children.clone()) else {
            return Vec::new();
        };
        for child in &old {
            arena.detach(*child);
        }
        let added: Vec<NodeId> = specs
            .iter()
            .map(|spec| arena.build(spec, Some(parent)))
            .collect();
        drop(arena);

        self.record(MutationRecord {
            target: parent,
            kind: MutationKind::ChildList,
            added: added.clone(),
            removed: old,
        });
        added
    }

    /// Deliver pending records to observers. Returns the number of records delivered.
    pub fn flush(&self) -> usize {
        let batch = std::mem::take(&mut *self.pending.lock());
        let arena = self.arena.read();
        let mut observers = self.observers.lock();
        let mut delivered = 0;

        observers.retain(|observer| {
            if !arena.nodes.contains_key(&observer.root) {
                debug!("Observed root {} left the document, closing stream", observer.root);
                return false;
            }
            let records: MutationBatch = batch
                .iter()
                .filter(|r| arena.contains(observer.root, r.target))
                .cloned()
                .collect();
            if records.is_empty() {
                return !observer.sender.is_closed();
            }
            delivered += records.len();
            observer.sender.send(records).is_ok()
        });

        delivered
    }

    /// Number of records waiting for the next flush.
    pub fn pending_records(&self) -> usize {
        self.pending.lock().len()
    }

    /// Number of nodes currently attached.
    pub fn node_count(&self) -> usize {
        self.arena.read().nodes.len()
    }

    /// Indented outline of the document.
    pub fn render(&self) -> String {
        let arena = self.arena.read();
        let mut out = String::new();
        arena.render(arena.root, 0, &mut out);
        out
    }

    fn record(&self, record: MutationRecord) {
        self.pending.lock().push(record);
    }
}

impl HostDocument for MemoryDocument {
    fn root(&self) -> NodeId {
        self.arena.read().root
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.arena.read().nodes.contains_key(&node)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        match &self.arena.read().nodes.get(&node)?.data {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            NodeData::Text(_) => None,
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.arena.read().nodes.get(&node)?.data {
            NodeData::Element { attrs, .. } => attrs.get(name).cloned(),
            NodeData::Text(_) => None,
        }
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> bool {
        let mut arena = self.arena.write();
        match arena.nodes.get_mut(&node).map(|n| &mut n.data) {
            Some(NodeData::Element { attrs, .. }) => {
                attrs.insert(name.to_string(), value.to_string());
                true
            }
            _ => false,
        }
    }

    fn remove_attribute(&self, node: NodeId, name: &str) -> bool {
        let mut arena = self.arena.write();
        match arena.nodes.get_mut(&node).map(|n| &mut n.data) {
            Some(NodeData::Element { attrs, .. }) => {
                attrs.remove(name);
                true
            }
            _ => false,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.read().nodes.get(&node)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.arena
            .read()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn text_content(&self, node: NodeId) -> Option<String> {
        let arena = self.arena.read();
        if !arena.nodes.contains_key(&node) {
            return None;
        }
        let mut out = String::new();
        arena.collect_text(node, &mut out);
        Some(out)
    }

    fn set_text_content(&self, node: NodeId, text: &str) -> bool {
        let mut arena = self.arena.write();
        let old = match arena.nodes.get(&node) {
            Some(Node {
                data: NodeData::Element { .. },
                children,
                ..
            }) => children.clone(),
            _ => return false,
        };
        for child in &old {
            arena.detach(*child);
        }
        let text_node = arena.alloc(NodeData::Text(text.to_string()), Some(node));
        drop(arena);

        self.record(MutationRecord {
            target: node,
            kind: MutationKind::CharacterData,
            added: vec![text_node],
            removed: old,
        });
        true
    }

    fn append_element(&self, parent: NodeId, spec: &NodeSpec) -> Option<NodeId> {
        let mut arena = self.arena.write();
        match arena.nodes.get(&parent).map(|n| &n.data) {
            Some(NodeData::Element { .. }) => {}
            _ => return None,
        }
        let id = arena.build(spec, Some(parent));
        drop(arena);

        self.record(MutationRecord {
            target: parent,
            kind: MutationKind::ChildList,
            added: vec![id],
            removed: Vec::new(),
        });
        Some(id)
    }

    fn remove_node(&self, node: NodeId) -> bool {
        let mut arena = self.arena.write();
        if node == arena.root {
            return false;
        }
        let Some(parent) = arena.nodes.get(&node).map(|n| n.parent) else {
            return false;
        };
        arena.detach(node);
        drop(arena);

        if let Some(parent) = parent {
            self.record(MutationRecord {
                target: parent,
                kind: MutationKind::ChildList,
                added: Vec::new(),
                removed: vec![node],
            });
        }
        true
    }

    fn observe(&self, root: NodeId) -> Result<MutationStream, DomError> {
        if !self.is_connected(root) {
            return Err(DomError::Detached(root));
        }
        let (sender, receiver) = mpsc::unbounded_channel();
        self.observers.lock().push(Observer { root, sender });
        Ok(receiver)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
