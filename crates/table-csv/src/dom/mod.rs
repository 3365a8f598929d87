//! Arena-backed host document.
//!
//! Every node lives in one contiguous arena and is addressed by a copyable
//! [`NodeId`]. Nodes are never freed: removing a node detaches it from its
//! parent, but its id stays valid so closures that captured it can still ask
//! whether it is connected.

mod event;
mod html;
mod mutation;
mod text;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use event::{Event, EventKind, Listener};
pub use mutation::{MutationRecord, ObserveOptions, ObserverId};

use mutation::Observer;

/// Node identifier, an index into the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The document node is always the first node in the arena.
    pub const DOCUMENT: NodeId = NodeId(0);

    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors raised by tree operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Hierarchy violation: {0}")]
    Hierarchy(String),

    #[error("Serialization failed: {0}")]
    Serialize(String),
}

/// Convenience result type.
pub type DomResult<T> = Result<T, DomError>;

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
}

/// Tag name and attributes of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    name: String,
    attrs: Vec<(String, String)>,
}

impl ElementData {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Lower-case tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Attributes in source order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        match self
            .attrs
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_ascii_lowercase(), value.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// A live document: node arena, event listeners and mutation observers.
pub struct Document {
    nodes: Vec<Node>,
    listeners: HashMap<NodeId, Vec<Listener>>,
    observers: Vec<Option<Observer>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .field("observers", &self.observers.iter().flatten().count())
            .finish()
    }
}

impl Document {
    /// Create an empty document containing only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            listeners: HashMap::new(),
            observers: Vec::new(),
        }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId::DOCUMENT
    }

    /// First `body` element, or the document node if the page has none.
    pub fn body(&self) -> NodeId {
        self.descendants(self.root())
            .into_iter()
            .find(|&id| self.tag_name(id) == Some("body"))
            .unwrap_or(NodeId::DOCUMENT)
    }

    /// Number of nodes ever created, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.nodes.get(id.index()).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .ok_or(DomError::UnknownNode(id))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    // ── Creation ────────────────────────────────────────────────────────

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element(ElementData::new(name)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    // ── Inspection ──────────────────────────────────────────────────────

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index()).map(|n| &n.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.index()).and_then(|n| n.parent)
    }

    /// Parent, if it is an element.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.index())
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// `root` and every node below it, in document order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(root) {
            return out;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }

    /// Proper ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Nearest inclusive ancestor element satisfying `pred`.
    pub fn closest<F>(&self, id: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&ElementData) -> bool,
    {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.element(n).is_some_and(&pred))
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether the node is attached to the document.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_inclusive_ancestor(NodeId::DOCUMENT, id)
    }

    // ── Attributes ──────────────────────────────────────────────────────

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element(el) => {
                el.set_attr(name, value);
                Ok(())
            }
            _ => Err(DomError::Hierarchy(format!("{id} is not an element"))),
        }
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let current = self.attr(id, "class").unwrap_or("").trim().to_string();
        let value = if current.is_empty() {
            class.to_string()
        } else {
            format!("{current} {class}")
        };
        self.set_attribute(id, "class", &value)
    }

    /// Replace all children with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        let old = self.node(id)?.children.clone();
        for child in old {
            self.remove_child(id, child)?;
        }
        if !text.is_empty() {
            let t = self.create_text(text);
            self.append_child(id, t)?;
        }
        Ok(())
    }

    // ── Tree mutation ───────────────────────────────────────────────────

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (or last when
    /// `None`). A child that is already attached somewhere is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.check_insert(parent, child, reference)?;

        if let Some(old_parent) = self.parent(child) {
            self.remove_child(old_parent, child)?;
        }

        let node = self.node_mut(parent)?;
        let pos = match reference {
            Some(r) => node
                .children
                .iter()
                .position(|&c| c == r)
                .ok_or(DomError::NotAChild { parent, child: r })?,
            None => node.children.len(),
        };
        node.children.insert(pos, child);
        self.node_mut(child)?.parent = Some(parent);

        self.queue_mutation(MutationRecord {
            target: parent,
            added_nodes: vec![child],
            removed_nodes: Vec::new(),
        });
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.node(child)?;
        let node = self.node_mut(parent)?;
        let pos = node
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(DomError::NotAChild { parent, child })?;
        node.children.remove(pos);
        self.node_mut(child)?.parent = None;

        self.queue_mutation(MutationRecord {
            target: parent,
            added_nodes: Vec::new(),
            removed_nodes: vec![child],
        });
        Ok(())
    }

    fn check_insert(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        let parent_node = self.node(parent)?;
        let child_node = self.node(child)?;

        if matches!(parent_node.data, NodeData::Text(_) | NodeData::Comment(_)) {
            return Err(DomError::Hierarchy(format!(
                "{parent} cannot have children"
            )));
        }
        if matches!(child_node.data, NodeData::Document) {
            return Err(DomError::Hierarchy("the document node cannot be inserted".into()));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::Hierarchy(format!(
                "{child} is an inclusive ancestor of {parent}"
            )));
        }
        if let Some(r) = reference {
            if r == child {
                return Err(DomError::Hierarchy(format!(
                    "{child} cannot be inserted before itself"
                )));
            }
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild { parent, child: r });
            }
        }
        Ok(())
    }
}

/// Iterator over proper ancestors, nearest first.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}
