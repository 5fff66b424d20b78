//! Text block detection.
//!
//! Decides whether an element is exported as one text box or walked as a
//! container. This is an allow-list heuristic, not inline layout.

use crate::dom::DomView;

/// Tags treated as inline regardless of their computed `display`.
const INLINE_TAGS: &[&str] = &["span", "b", "strong", "em"];

/// True when `node` holds text and all of its child elements are inline,
/// so the whole element can become a single run sequence.
pub fn is_text_container<D: DomView>(dom: &D, node: D::NodeId) -> bool {
    if dom.text_content(node).trim().is_empty() {
        return false;
    }

    let children = dom.children(node);
    if children.is_empty() {
        return true;
    }

    children.into_iter().all(|child| is_inline(dom, child))
}

fn is_inline<D: DomView>(dom: &D, node: D::NodeId) -> bool {
    let display_inline = dom
        .computed_style(node)
        .is_some_and(|s| s.display.contains("inline"));
    display_inline || INLINE_TAGS.contains(&dom.tag_name(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::DomSnapshot;

    fn snapshot(children: &str) -> DomSnapshot {
        DomSnapshot::from_json(&format!(
            r#"{{"root": {{"tag": "div", "rect": {{"x":0,"y":0,"width":10,"height":10}},
                "children": [{}]}}}}"#,
            children
        ))
        .unwrap()
    }

    const RECT: &str = r#""rect": {"x":0,"y":0,"width":10,"height":10}"#;

    #[test]
    fn test_text_leaf() {
        let dom = snapshot(r#"{"text": "Hello"}"#);
        assert!(is_text_container(&dom, dom.root()));
    }

    #[test]
    fn test_whitespace_only() {
        let dom = snapshot(r#"{"text": "  \n "}"#);
        assert!(!is_text_container(&dom, dom.root()));
    }

    #[test]
    fn test_block_child() {
        let dom = snapshot(&format!(
            r#"{{"tag": "div", {RECT}, "children": [{{"text": "Hi"}}]}}"#
        ));
        assert!(!is_text_container(&dom, dom.root()));
    }

    #[test]
    fn test_span_children() {
        let dom = snapshot(&format!(
            r#"{{"tag": "span", {RECT}, "children": [{{"text": "Hi"}}]}},
               {{"text": " and "}},
               {{"tag": "strong", {RECT}, "children": [{{"text": "bye"}}]}}"#
        ));
        assert!(is_text_container(&dom, dom.root()));
    }

    #[test]
    fn test_inline_display_child() {
        let dom = snapshot(&format!(
            r#"{{"tag": "a", {RECT}, "style": {{"display": "inline-block"}},
                "children": [{{"text": "link"}}]}}"#
        ));
        assert!(is_text_container(&dom, dom.root()));
    }
}
