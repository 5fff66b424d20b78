//! `selectors` crate glue so export roots can be chosen with real CSS
//! selectors (combinators, attribute and structural pseudo-classes).

use std::fmt;

use cssparser::ToCss;
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::matching::ElementSelectorFlags;
use selectors::parser::{SelectorList, SelectorParseErrorKind};
use selectors::{OpaqueElement, SelectorImpl};

use crate::dom::{DomView, NodeKind};
use crate::snapshot::{DomSnapshot, SnapshotNodeId};

/// Selector implementation for snapshot documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSelectors;

/// Identifiers, local names, attribute values and namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct CssIdent(pub String);

impl precomputed_hash::PrecomputedHash for CssIdent {
    fn precomputed_hash(&self) -> u32 {
        self.0
            .bytes()
            .fold(0u32, |h, byte| h.wrapping_mul(31).wrapping_add(byte as u32))
    }
}

impl ToCss for CssIdent {
    fn to_css<W: fmt::Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.0)
    }
}

impl From<String> for CssIdent {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'a> From<&'a str> for CssIdent {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for CssIdent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Snapshots carry no pseudo-elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoElement {}

impl ToCss for PseudoElement {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = SnapshotSelectors;

    fn accepts_state_pseudo_classes(&self) -> bool {
        false
    }

    fn valid_after_slotted(&self) -> bool {
        false
    }
}

/// User-action states never hold in a static capture, so none are parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NonTSPseudoClass {}

impl selectors::parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = SnapshotSelectors;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl ToCss for NonTSPseudoClass {
    fn to_css<W: fmt::Write>(&self, _dest: &mut W) -> fmt::Result {
        match *self {}
    }
}

impl SelectorImpl for SnapshotSelectors {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssIdent;
    type Identifier = CssIdent;
    type LocalName = CssIdent;
    type NamespaceUrl = CssIdent;
    type NamespacePrefix = CssIdent;
    type BorrowedLocalName = CssIdent;
    type BorrowedNamespaceUrl = CssIdent;
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

impl<'i> selectors::parser::Parser<'i> for SnapshotSelectors {
    type Impl = SnapshotSelectors;
    type Error = SelectorParseErrorKind<'i>;
}

/// Parse a comma-separated selector list, or `None` when it is invalid.
pub fn parse_selector_list(selector: &str) -> Option<SelectorList<SnapshotSelectors>> {
    let mut input = cssparser::ParserInput::new(selector);
    let mut parser = cssparser::Parser::new(&mut input);
    match SelectorList::parse(
        &SnapshotSelectors,
        &mut parser,
        selectors::parser::ParseRelative::No,
    ) {
        Ok(list) => Some(list),
        Err(e) => {
            log::debug!("Invalid selector {:?}: {:?}", selector, e.kind);
            None
        }
    }
}

/// Whether any selector in `list` matches `element`.
pub fn matches(list: &SelectorList<SnapshotSelectors>, element: &SnapshotElement<'_>) -> bool {
    let mut caches = SelectorCaches::default();
    let mut context = MatchingContext::new(
        selectors::matching::MatchingMode::Normal,
        None,
        &mut caches,
        selectors::context::QuirksMode::NoQuirks,
        selectors::matching::NeedsSelectorFlags::No,
        selectors::matching::MatchingForInvalidation::No,
    );

    list.slice().iter().any(|selector| {
        selectors::matching::matches_selector(selector, 0, None, element, &mut context)
    })
}

/// An element of a [`DomSnapshot`] as seen by selector matching.
#[derive(Clone, Copy)]
pub struct SnapshotElement<'a> {
    dom: &'a DomSnapshot,
    id: SnapshotNodeId,
}

impl<'a> SnapshotElement<'a> {
    pub fn new(dom: &'a DomSnapshot, id: SnapshotNodeId) -> Self {
        Self { dom, id }
    }

    fn is_element(&self, id: SnapshotNodeId) -> bool {
        self.dom.node_kind(id) == NodeKind::Element
    }

    fn sibling_element(&self, step: isize) -> Option<Self> {
        let parent = self.dom.parent(self.id)?;
        let siblings = self.dom.child_nodes(parent);
        let mut index = siblings.iter().position(|&s| s == self.id)? as isize;
        loop {
            index += step;
            let sibling = *siblings.get(usize::try_from(index).ok()?)?;
            if self.is_element(sibling) {
                return Some(Self::new(self.dom, sibling));
            }
        }
    }
}

impl fmt::Debug for SnapshotElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotElement")
            .field("id", &self.id)
            .field("tag", &self.dom.tag_name(self.id))
            .finish()
    }
}

impl<'a> selectors::Element for SnapshotElement<'a> {
    type Impl = SnapshotSelectors;

    fn opaque(&self) -> OpaqueElement {
        match self.dom.node(self.id) {
            Some(node) => OpaqueElement::new(node),
            None => OpaqueElement::new(self.dom),
        }
    }

    fn parent_element(&self) -> Option<Self> {
        self.dom
            .parent(self.id)
            .filter(|&parent| self.is_element(parent))
            .map(|parent| Self::new(self.dom, parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling_element(-1)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling_element(1)
    }

    fn first_element_child(&self) -> Option<Self> {
        self.dom
            .children(self.id)
            .first()
            .map(|&child| Self::new(self.dom, child))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssIdent) -> bool {
        self.dom.tag_name(self.id).eq_ignore_ascii_case(&name.0)
    }

    fn has_namespace(&self, _ns: &CssIdent) -> bool {
        true
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.dom.tag_name(self.id) == other.dom.tag_name(other.id)
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&CssIdent>,
        local_name: &CssIdent,
        operation: &AttrSelectorOperation<&CssIdent>,
    ) -> bool {
        if let NamespaceConstraint::Specific(ns) = ns {
            if !ns.0.is_empty() {
                return false;
            }
        }
        self.dom
            .attribute(self.id, &local_name.0)
            .is_some_and(|value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match *pc {}
    }

    fn match_pseudo_element(
        &self,
        pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Self::Impl>,
    ) -> bool {
        match *pe {}
    }

    fn is_link(&self) -> bool {
        self.dom.tag_name(self.id) == "a" && self.dom.attribute(self.id, "href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(&self, id: &CssIdent, case_sensitivity: CaseSensitivity) -> bool {
        self.dom
            .attribute(self.id, "id")
            .is_some_and(|own| case_sensitivity.eq(own.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &CssIdent, case_sensitivity: CaseSensitivity) -> bool {
        self.dom
            .attribute(self.id, "class")
            .unwrap_or("")
            .split_whitespace()
            .any(|class| case_sensitivity.eq(class.as_bytes(), name.0.as_bytes()))
    }

    fn imported_part(&self, _name: &CssIdent) -> Option<CssIdent> {
        None
    }

    fn is_part(&self, _name: &CssIdent) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.dom.child_nodes(self.id).iter().all(|&child| {
            match self.dom.node_kind(child) {
                NodeKind::Element => false,
                NodeKind::Text => self.dom.node_value(child).unwrap_or("").is_empty(),
                NodeKind::Other => true,
            }
        })
    }

    fn is_root(&self) -> bool {
        self.dom.parent(self.id).is_none()
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn add_element_unique_hashes(&self, _filter: &mut selectors::bloom::BloomFilter) -> bool {
        false
    }

    fn has_custom_state(&self, _name: &CssIdent) -> bool {
        false
    }
}
