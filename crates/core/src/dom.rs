//! Read-only view of a rendered document.
//!
//! The walker never touches a live rendering engine. Everything it needs,
//! computed style and layout boxes, is asked of a [`DomView`], which is
//! passed explicitly down the traversal.

use serde::{Deserialize, Serialize};

/// A layout box in viewport pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when either dimension collapses to nothing.
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    /// True when both dimensions differ from `other` by less than `tolerance`.
    pub fn same_size_as(&self, other: &Rect, tolerance: f64) -> bool {
        (self.width - other.width).abs() < tolerance
            && (self.height - other.height).abs() < tolerance
    }
}

/// The kind of a DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Other,
}

/// Resolved CSS properties of an element, as CSS-syntax strings.
///
/// Field names follow the camelCase keys of a browser's computed style
/// declaration so snapshots can be captured verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: String,
    pub overflow: String,
    pub background_color: String,
    pub background_image: String,
    pub border_color: String,
    pub border_width: String,
    pub border_radius: String,
    pub box_shadow: String,
    pub color: String,
    pub font_family: String,
    pub font_size: String,
    pub font_weight: String,
    pub text_align: String,
    pub text_transform: String,
    pub align_items: String,
}

impl Default for ComputedStyle {
    /// Initial values a browser reports for an unstyled block element.
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: "1".to_string(),
            overflow: "visible".to_string(),
            background_color: "rgba(0, 0, 0, 0)".to_string(),
            background_image: "none".to_string(),
            border_color: "rgb(0, 0, 0)".to_string(),
            border_width: "0px".to_string(),
            border_radius: "0px".to_string(),
            box_shadow: "none".to_string(),
            color: "rgb(0, 0, 0)".to_string(),
            font_family: "Arial".to_string(),
            font_size: "16px".to_string(),
            font_weight: "400".to_string(),
            text_align: "start".to_string(),
            text_transform: "none".to_string(),
            align_items: "normal".to_string(),
        }
    }
}

impl ComputedStyle {
    /// `display:none`, `visibility:hidden` or a zero `opacity`.
    pub fn is_hidden(&self) -> bool {
        self.display.trim() == "none"
            || self.visibility.trim() == "hidden"
            || self.opacity.trim().parse::<f64>().map(|o| o == 0.0).unwrap_or(false)
    }
}

/// Style and geometry oracle over a document tree.
pub trait DomView {
    /// Handle identifying a node inside this view.
    type NodeId: Copy + Eq + std::fmt::Debug;

    fn node_kind(&self, node: Self::NodeId) -> NodeKind;

    /// Lowercase tag name of an element, empty for other nodes.
    fn tag_name(&self, node: Self::NodeId) -> &str;

    /// Computed style of an element, `None` for other nodes.
    fn computed_style(&self, node: Self::NodeId) -> Option<&ComputedStyle>;

    /// Layout box of an element in viewport pixels.
    fn bounding_rect(&self, node: Self::NodeId) -> Rect;

    /// All child nodes, text included, in document order.
    fn child_nodes(&self, node: Self::NodeId) -> Vec<Self::NodeId>;

    fn parent(&self, node: Self::NodeId) -> Option<Self::NodeId>;

    /// Value of a text node, `None` for other nodes.
    fn node_value(&self, node: Self::NodeId) -> Option<&str>;

    fn attribute(&self, node: Self::NodeId, name: &str) -> Option<&str>;

    /// First element in document order matching `selector`.
    fn query_selector(&self, selector: &str) -> Option<Self::NodeId>;

    /// Child elements in document order.
    fn children(&self, node: Self::NodeId) -> Vec<Self::NodeId> {
        self.child_nodes(node)
            .into_iter()
            .filter(|&c| self.node_kind(c) == NodeKind::Element)
            .collect()
    }

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self, node: Self::NodeId) -> String {
        let mut out = String::new();
        collect_text(self, node, &mut out);
        out
    }
}

fn collect_text<D: DomView + ?Sized>(dom: &D, node: D::NodeId, out: &mut String) {
    match dom.node_kind(node) {
        NodeKind::Text => {
            if let Some(value) = dom.node_value(node) {
                out.push_str(value);
            }
        }
        NodeKind::Element => {
            for child in dom.child_nodes(node) {
                collect_text(dom, child, out);
            }
        }
        NodeKind::Other => {}
    }
}
