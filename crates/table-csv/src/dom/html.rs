//! HTML parsing (via `scraper`) and serialization (via `html5ever`).

use std::collections::HashMap;
use std::io;

use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{LocalName, Namespace, QualName};
use scraper::{Html, Node};

use super::{Document, DomError, DomResult, ElementData, NodeData, NodeId};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

impl Document {
    /// Parse a full HTML page.
    ///
    /// Parsing never fails: html5ever recovers from malformed markup the
    /// way browsers do. Doctypes and processing instructions are dropped.
    pub fn parse_html(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Document::new();
        let root = parsed.tree.root();
        let mut ids = HashMap::new();
        ids.insert(root.id(), NodeId::DOCUMENT);

        for node in root.descendants() {
            let parent = node.parent().and_then(|p| ids.get(&p.id()).copied());
            let id = match node.value() {
                Node::Document | Node::Fragment => continue,
                Node::Element(el) => {
                    let mut data = ElementData::new(el.name());
                    for (name, value) in el.attrs() {
                        data.set_attr(name, value);
                    }
                    doc.push(NodeData::Element(data))
                }
                Node::Text(text) => doc.create_text(text),
                Node::Comment(comment) => doc.create_comment(comment),
                _ => continue,
            };
            ids.insert(node.id(), id);
            if let Some(parent) = parent {
                doc.attach_unobserved(parent, id);
            }
        }

        tracing::debug!("Parsed HTML into {} nodes", doc.len());
        doc
    }

    /// Link a freshly created node under `parent` without mutation records.
    fn attach_unobserved(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(parent.index()) {
            node.children.push(child);
        }
        if let Some(node) = self.nodes.get_mut(child.index()) {
            node.parent = Some(parent);
        }
    }

    /// Serialize a node and its subtree.
    pub fn outer_html(&self, id: NodeId) -> DomResult<String> {
        self.node(id)?;
        write_markup(&Subtree { doc: self, id })
    }

    /// Serialize the whole document, prefixed with an HTML5 doctype.
    pub fn to_html(&self) -> DomResult<String> {
        write_markup(&Subtree {
            doc: self,
            id: NodeId::DOCUMENT,
        })
    }
}

/// A node and everything below it, in the shape html5ever serializes.
struct Subtree<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl Serialize for Subtree<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match traversal_scope {
            TraversalScope::IncludeNode => self.write_node(self.id, serializer),
            TraversalScope::ChildrenOnly(_) => self
                .doc
                .children(self.id)
                .iter()
                .try_for_each(|&child| self.write_node(child, serializer)),
        }
    }
}

impl Subtree<'_> {
    fn write_node<S: Serializer>(&self, id: NodeId, serializer: &mut S) -> io::Result<()> {
        match self.doc.data(id) {
            Some(NodeData::Document) => {
                serializer.write_doctype("html")?;
                for &child in self.doc.children(id) {
                    self.write_node(child, serializer)?;
                }
                Ok(())
            }
            Some(NodeData::Element(el)) => {
                let name = html_name(el.name());
                let attrs: Vec<(QualName, &str)> = el
                    .attrs()
                    .map(|(attr, value)| (attr_name(attr), value))
                    .collect();
                serializer.start_elem(
                    name.clone(),
                    attrs.iter().map(|(attr, value)| (attr, *value)),
                )?;
                for &child in self.doc.children(id) {
                    self.write_node(child, serializer)?;
                }
                serializer.end_elem(name)
            }
            Some(NodeData::Text(text)) => serializer.write_text(text),
            Some(NodeData::Comment(text)) => serializer.write_comment(text),
            None => Ok(()),
        }
    }
}

fn html_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(local))
}

fn attr_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(local))
}

fn write_markup(subtree: &Subtree<'_>) -> DomResult<String> {
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    let mut out = Vec::new();
    serialize(&mut out, subtree, opts).map_err(|e| DomError::Serialize(e.to_string()))?;
    String::from_utf8(out).map_err(|e| DomError::Serialize(e.to_string()))
}
