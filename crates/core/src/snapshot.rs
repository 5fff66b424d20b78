//! DOM snapshots: a serialisable capture of a rendered subtree.
//!
//! A snapshot records what a browser reports for each element (tag,
//! attributes, computed style, bounding box) and the value of each text
//! node. It is the [`DomView`] used by the CLI and the wasm worker.
//!
//! ```json
//! { "root": { "tag": "div", "attributes": { "id": "slide" },
//!             "style": { "backgroundColor": "rgb(255, 0, 0)" },
//!             "rect": { "x": 0, "y": 0, "width": 200, "height": 100 },
//!             "children": [ { "text": "Hello" } ] } }
//! ```

use crate::dom::{ComputedStyle, DomView, NodeKind, Rect};
use crate::error::{Error, Result};
use crate::selector::{matches, parse_selector_list, SnapshotElement};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct SnapshotDocument {
    root: ElementJson,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NodeJson {
    Text { text: String },
    Element(ElementJson),
}

#[derive(Debug, Deserialize)]
struct ElementJson {
    tag: String,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
    #[serde(default)]
    style: ComputedStyle,
    rect: Rect,
    #[serde(default)]
    children: Vec<NodeJson>,
}

/// Handle of a node inside a [`DomSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotNodeId(usize);

#[derive(Debug)]
enum NodeData {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        style: ComputedStyle,
        rect: Rect,
    },
    Text(String),
}

#[derive(Debug)]
pub(crate) struct SnapshotNode {
    parent: Option<SnapshotNodeId>,
    children: Vec<SnapshotNodeId>,
    data: NodeData,
}

/// An immutable document tree loaded from a JSON capture.
///
/// Nodes are stored in document (pre-)order, so a linear scan visits them
/// in the order a selector query would.
#[derive(Debug)]
pub struct DomSnapshot {
    nodes: Vec<SnapshotNode>,
}

impl DomSnapshot {
    /// Parse a snapshot from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: SnapshotDocument = serde_json::from_str(json)
            .map_err(|e| Error::SnapshotError(format!("Invalid snapshot JSON: {}", e)))?;
        Ok(Self::from_document(doc))
    }

    /// Parse a snapshot from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let doc: SnapshotDocument = serde_json::from_reader(reader)
            .map_err(|e| Error::SnapshotError(format!("Invalid snapshot JSON: {}", e)))?;
        Ok(Self::from_document(doc))
    }

    fn from_document(doc: SnapshotDocument) -> Self {
        let mut snapshot = Self { nodes: Vec::new() };
        snapshot.push_node(NodeJson::Element(doc.root), None);
        snapshot
    }

    fn push_node(&mut self, node: NodeJson, parent: Option<SnapshotNodeId>) -> SnapshotNodeId {
        let id = SnapshotNodeId(self.nodes.len());
        match node {
            NodeJson::Text { text } => {
                self.nodes.push(SnapshotNode {
                    parent,
                    children: Vec::new(),
                    data: NodeData::Text(text),
                });
            }
            NodeJson::Element(el) => {
                self.nodes.push(SnapshotNode {
                    parent,
                    children: Vec::new(),
                    data: NodeData::Element {
                        tag: el.tag.to_ascii_lowercase(),
                        attributes: el.attributes,
                        style: el.style,
                        rect: el.rect,
                    },
                });
                for child in el.children {
                    let child_id = self.push_node(child, Some(id));
                    self.nodes[id.0].children.push(child_id);
                }
            }
        }
        id
    }

    /// The captured root element.
    pub fn root(&self) -> SnapshotNodeId {
        SnapshotNodeId(0)
    }

    /// Number of nodes, text nodes included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn node(&self, id: SnapshotNodeId) -> Option<&SnapshotNode> {
        self.nodes.get(id.0)
    }
}

impl DomView for DomSnapshot {
    type NodeId = SnapshotNodeId;

    fn node_kind(&self, node: SnapshotNodeId) -> NodeKind {
        match self.node(node).map(|n| &n.data) {
            Some(NodeData::Element { .. }) => NodeKind::Element,
            Some(NodeData::Text(_)) => NodeKind::Text,
            None => NodeKind::Other,
        }
    }

    fn tag_name(&self, node: SnapshotNodeId) -> &str {
        match self.node(node).map(|n| &n.data) {
            Some(NodeData::Element { tag, .. }) => tag,
            _ => "",
        }
    }

    fn computed_style(&self, node: SnapshotNodeId) -> Option<&ComputedStyle> {
        match self.node(node).map(|n| &n.data) {
            Some(NodeData::Element { style, .. }) => Some(style),
            _ => None,
        }
    }

    fn bounding_rect(&self, node: SnapshotNodeId) -> Rect {
        match self.node(node).map(|n| &n.data) {
            Some(NodeData::Element { rect, .. }) => *rect,
            _ => Rect::default(),
        }
    }

    fn child_nodes(&self, node: SnapshotNodeId) -> Vec<SnapshotNodeId> {
        self.node(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn parent(&self, node: SnapshotNodeId) -> Option<SnapshotNodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn node_value(&self, node: SnapshotNodeId) -> Option<&str> {
        match self.node(node).map(|n| &n.data) {
            Some(NodeData::Text(text)) => Some(text),
            _ => None,
        }
    }

    fn attribute(&self, node: SnapshotNodeId, name: &str) -> Option<&str> {
        match self.node(node).map(|n| &n.data) {
            Some(NodeData::Element { attributes, .. }) => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    fn query_selector(&self, selector: &str) -> Option<SnapshotNodeId> {
        let list = parse_selector_list(selector)?;
        (0..self.nodes.len())
            .map(SnapshotNodeId)
            .filter(|&id| self.node_kind(id) == NodeKind::Element)
            .find(|&id| matches(&list, &SnapshotElement::new(self, id)))
    }
}
