#![forbid(unsafe_code)]

//! In-memory page host.
//!
//! [`MemoryPage`] implements every host trait over a flat element table with
//! document-space geometry. It records each side effect (scrolls, history
//! replacements, observer calls, class writes) so drivers can assert on them.
//! Nothing here touches a real DOM; it is the deterministic counterpart of
//! the browser host, used by tests and headless embedding.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use crate::copy::ClipboardError;
use crate::geometry::Rect;
use crate::host::{
    Document, Location, NodeId, ScrollBehavior, SelectionCopy, Viewport, VisibilityObserver,
};

#[derive(Debug, Default, Clone)]
struct Element {
    anchor: Option<String>,
    /// Geometry in document coordinates (independent of scroll).
    rect: Rect,
    classes: BTreeSet<String>,
    attributes: BTreeMap<String, String>,
    text: Option<String>,
    field_value: Option<String>,
    removed: bool,
}

/// One recorded programmatic scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRecord {
    pub top: f64,
    pub behavior: ScrollBehavior,
}

#[derive(Debug)]
struct Inner {
    viewport: (f64, f64),
    scroll_top: f64,
    elements: Vec<Element>,
    fragment: Option<String>,
    history_replacements: Vec<String>,
    scrolls: Vec<ScrollRecord>,
    observed: Vec<NodeId>,
    disconnects: usize,
    class_writes: BTreeMap<(NodeId, String), usize>,
    selection_result: Result<(), ClipboardError>,
    selection_copies: Vec<NodeId>,
}

/// Deterministic, inspectable page host.
#[derive(Debug)]
pub struct MemoryPage {
    inner: RefCell<Inner>,
}

impl MemoryPage {
    /// Create an empty page with the given viewport size.
    #[must_use]
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            inner: RefCell::new(Inner {
                viewport: (viewport_width, viewport_height),
                scroll_top: 0.0,
                elements: Vec::new(),
                fragment: None,
                history_replacements: Vec::new(),
                scrolls: Vec::new(),
                observed: Vec::new(),
                disconnects: 0,
                class_writes: BTreeMap::new(),
                selection_result: Ok(()),
                selection_copies: Vec::new(),
            }),
        }
    }

    /// Add an element at a document-space position, optionally addressable
    /// by anchor id.
    pub fn add_element(&self, anchor: Option<&str>, rect: Rect) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = NodeId(inner.elements.len() as u32);
        inner.elements.push(Element {
            anchor: anchor.map(str::to_owned),
            rect,
            ..Element::default()
        });
        id
    }

    /// Add a button-like element with text content.
    pub fn add_button(&self, text: &str) -> NodeId {
        let node = self.add_element(None, Rect::new(0.0, 0.0, 80.0, 32.0));
        self.set_text(node, text);
        node
    }

    /// Add a read-only input holding `value`.
    pub fn add_field(&self, value: &str) -> NodeId {
        let node = self.add_element(None, Rect::new(0.0, 0.0, 320.0, 32.0));
        self.set_field_value(node, value);
        node
    }

    /// Replace a field's value.
    pub fn set_field_value(&self, node: NodeId, value: &str) {
        self.with_element(node, |el| el.field_value = Some(value.to_owned()));
    }

    /// Move an element (document coordinates).
    pub fn set_rect(&self, node: NodeId, rect: Rect) {
        self.with_element(node, |el| el.rect = rect);
    }

    /// Detach an element: anchors stop resolving and geometry disappears.
    pub fn remove_element(&self, node: NodeId) {
        self.with_element(node, |el| el.removed = true);
    }

    /// Set the scroll offset directly, as a user scroll would.
    pub fn set_scroll_top(&self, top: f64) {
        self.inner.borrow_mut().scroll_top = top;
    }

    /// Set the fragment directly, as the initial URL would.
    pub fn set_fragment(&self, fragment: Option<&str>) {
        self.inner.borrow_mut().fragment = fragment.map(str::to_owned);
    }

    /// Outcome of subsequent selection copies.
    pub fn set_selection_result(&self, result: Result<(), ClipboardError>) {
        self.inner.borrow_mut().selection_result = result;
    }

    /// Attribute value, if set.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let inner = self.inner.borrow();
        inner
            .elements
            .get(node.0 as usize)
            .and_then(|el| el.attributes.get(name).cloned())
    }

    /// Programmatic scrolls, oldest first.
    #[must_use]
    pub fn scrolls(&self) -> Vec<ScrollRecord> {
        self.inner.borrow().scrolls.clone()
    }

    /// Fragments written through history replacement, oldest first.
    #[must_use]
    pub fn history_replacements(&self) -> Vec<String> {
        self.inner.borrow().history_replacements.clone()
    }

    /// Elements currently under observation, in observe order.
    #[must_use]
    pub fn observed(&self) -> Vec<NodeId> {
        self.inner.borrow().observed.clone()
    }

    /// Number of observer disconnects.
    #[must_use]
    pub fn disconnects(&self) -> usize {
        self.inner.borrow().disconnects
    }

    /// How many times `class` was added to `node`.
    #[must_use]
    pub fn class_writes(&self, node: NodeId, class: &str) -> usize {
        self.inner
            .borrow()
            .class_writes
            .get(&(node, class.to_owned()))
            .copied()
            .unwrap_or(0)
    }

    /// Fields that went through a selection copy, oldest first.
    #[must_use]
    pub fn selection_copies(&self) -> Vec<NodeId> {
        self.inner.borrow().selection_copies.clone()
    }

    fn with_element(&self, node: NodeId, f: impl FnOnce(&mut Element)) {
        let mut inner = self.inner.borrow_mut();
        if let Some(el) = inner.elements.get_mut(node.0 as usize) {
            f(el);
        }
    }

    fn read_element<T>(&self, node: NodeId, f: impl FnOnce(&Element) -> Option<T>) -> Option<T> {
        let inner = self.inner.borrow();
        inner
            .elements
            .get(node.0 as usize)
            .filter(|el| !el.removed)
            .and_then(f)
    }
}

impl Document for MemoryPage {
    fn resolve_anchor(&self, id: &str) -> Option<NodeId> {
        let inner = self.inner.borrow();
        inner
            .elements
            .iter()
            .position(|el| !el.removed && el.anchor.as_deref() == Some(id))
            .map(|idx| NodeId(idx as u32))
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        let scroll_top = self.inner.borrow().scroll_top;
        self.read_element(node, |el| {
            Some(Rect::new(
                el.rect.x,
                el.rect.y - scroll_top,
                el.rect.width,
                el.rect.height,
            ))
        })
    }

    fn set_class(&self, node: NodeId, class: &str, present: bool) {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let Some(el) = inner.elements.get_mut(node.0 as usize) else {
            return;
        };
        if present {
            el.classes.insert(class.to_owned());
            *inner
                .class_writes
                .entry((node, class.to_owned()))
                .or_insert(0) += 1;
        } else {
            el.classes.remove(class);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.read_element(node, |el| Some(el.classes.contains(class)))
            .unwrap_or(false)
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.with_element(node, |el| {
            el.attributes.insert(name.to_owned(), value.to_owned());
        });
    }

    fn text(&self, node: NodeId) -> Option<String> {
        self.read_element(node, |el| el.text.clone())
    }

    fn set_text(&self, node: NodeId, text: &str) {
        self.with_element(node, |el| el.text = Some(text.to_owned()));
    }

    fn field_value(&self, node: NodeId) -> Option<String> {
        self.read_element(node, |el| el.field_value.clone())
    }
}

impl Viewport for MemoryPage {
    fn scroll_top(&self) -> f64 {
        self.inner.borrow().scroll_top
    }

    fn height(&self) -> f64 {
        self.inner.borrow().viewport.1
    }

    fn width(&self) -> f64 {
        self.inner.borrow().viewport.0
    }

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        let mut inner = self.inner.borrow_mut();
        inner.scroll_top = top;
        inner.scrolls.push(ScrollRecord { top, behavior });
    }
}

impl Location for MemoryPage {
    fn fragment(&self) -> Option<String> {
        self.inner.borrow().fragment.clone()
    }

    fn replace_fragment(&self, id: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.fragment = Some(id.to_owned());
        inner.history_replacements.push(id.to_owned());
    }
}

impl VisibilityObserver for MemoryPage {
    fn observe(&self, node: NodeId) {
        let mut inner = self.inner.borrow_mut();
        if !inner.observed.contains(&node) {
            inner.observed.push(node);
        }
    }

    fn unobserve(&self, node: NodeId) {
        self.inner.borrow_mut().observed.retain(|n| *n != node);
    }

    fn disconnect(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.observed.clear();
        inner.disconnects += 1;
    }
}

impl SelectionCopy for MemoryPage {
    fn copy_selection(&self, field: NodeId) -> Result<(), ClipboardError> {
        let mut inner = self.inner.borrow_mut();
        inner.selection_copies.push(field);
        inner.selection_result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryPage;
    use crate::geometry::Rect;
    use crate::host::{Document, Location, ScrollBehavior, Viewport};

    #[test]
    fn bounding_rect_tracks_scroll() {
        let page = MemoryPage::new(1000.0, 800.0);
        let node = page.add_element(Some("install"), Rect::new(0.0, 1200.0, 1000.0, 300.0));
        assert_eq!(page.bounding_rect(node).map(|r| r.y), Some(1200.0));
        page.scroll_to(500.0, ScrollBehavior::Instant);
        assert_eq!(page.bounding_rect(node).map(|r| r.y), Some(700.0));
    }

    #[test]
    fn removed_elements_stop_resolving() {
        let page = MemoryPage::new(1000.0, 800.0);
        let node = page.add_element(Some("faq"), Rect::default());
        assert_eq!(page.resolve_anchor("faq"), Some(node));
        page.remove_element(node);
        assert_eq!(page.resolve_anchor("faq"), None);
        assert_eq!(page.bounding_rect(node), None);
    }

    #[test]
    fn replace_fragment_records_history() {
        let page = MemoryPage::new(1000.0, 800.0);
        assert_eq!(page.fragment(), None);
        page.replace_fragment("doc-install");
        assert_eq!(page.fragment().as_deref(), Some("doc-install"));
        assert_eq!(page.history_replacements(), vec!["doc-install".to_owned()]);
    }
}
