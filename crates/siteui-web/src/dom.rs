#![forbid(unsafe_code)]

//! `web-sys` implementation of the core host traits.

use std::cell::RefCell;

use js_sys::Reflect;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Clipboard, Element, HtmlDocument, HtmlInputElement, HtmlTextAreaElement, IntersectionObserver,
    ScrollToOptions, Window,
};

use siteui_core::ClipboardError;
use siteui_core::geometry::Rect;
use siteui_core::host::{Document, Location, SelectionCopy, Viewport, VisibilityObserver};
use siteui_core::{HostCapabilities, NodeId, ScrollBehavior};

use crate::registry::NodeRegistry;

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// The live page, seen through the host traits.
pub(crate) struct DomHost {
    window: Window,
    document: web_sys::Document,
    nodes: RefCell<NodeRegistry<Element>>,
    observer: RefCell<Option<IntersectionObserver>>,
}

impl DomHost {
    pub(crate) fn new(window: Window, document: web_sys::Document) -> Self {
        Self {
            window,
            document,
            nodes: RefCell::new(NodeRegistry::new()),
            observer: RefCell::new(None),
        }
    }

    pub(crate) fn window(&self) -> &Window {
        &self.window
    }

    pub(crate) fn intern(&self, element: Element) -> NodeId {
        self.nodes.borrow_mut().intern(element)
    }

    pub(crate) fn lookup(&self, element: &Element) -> Option<NodeId> {
        self.nodes.borrow().lookup(element)
    }

    /// First element in the document matching `selector`. Invalid selectors
    /// match nothing.
    pub(crate) fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    pub(crate) fn element(&self, node: NodeId) -> Option<Element> {
        self.nodes.borrow().get(node).cloned()
    }

    /// Install the observer that [`VisibilityObserver`] calls forward to.
    pub(crate) fn set_observer(&self, observer: Option<IntersectionObserver>) {
        *self.observer.borrow_mut() = observer;
    }

    /// `navigator.clipboard`, when the page is allowed to see it.
    pub(crate) fn clipboard(&self) -> Option<Clipboard> {
        let navigator = self.window.navigator();
        Reflect::get(navigator.as_ref(), &JsValue::from_str("clipboard"))
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_null())
            .and_then(|value| value.dyn_into::<Clipboard>().ok())
    }

    /// Detect the environment once at mount.
    pub(crate) fn detect_capabilities(&self) -> HostCapabilities {
        let mut caps = HostCapabilities::empty();
        if Reflect::has(self.window.as_ref(), &JsValue::from_str("IntersectionObserver"))
            .unwrap_or(false)
        {
            caps |= HostCapabilities::VISIBILITY_OBSERVER;
        }
        if self.clipboard().is_some() {
            caps |= HostCapabilities::ASYNC_CLIPBOARD;
        }
        if let Ok(Some(query)) = self.window.match_media(REDUCED_MOTION_QUERY)
            && query.matches()
        {
            caps |= HostCapabilities::REDUCED_MOTION;
        }
        caps
    }

    /// Forget every interned element so the page can be collected.
    pub(crate) fn release(&self) {
        self.set_observer(None);
        self.nodes.borrow_mut().clear();
    }
}

impl Document for DomHost {
    fn resolve_anchor(&self, id: &str) -> Option<NodeId> {
        let element = self.document.get_element_by_id(id)?;
        Some(self.intern(element))
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        let element = self.element(node)?;
        if !element.is_connected() {
            return None;
        }
        let r = element.get_bounding_client_rect();
        Some(Rect::new(r.x(), r.y(), r.width(), r.height()))
    }

    fn set_class(&self, node: NodeId, class: &str, present: bool) {
        if let Some(element) = self.element(node) {
            let _ = element.class_list().toggle_with_force(class, present);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|element| element.class_list().contains(class))
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element(node) {
            let _ = element.set_attribute(name, value);
        }
    }

    fn text(&self, node: NodeId) -> Option<String> {
        self.element(node)?.text_content()
    }

    fn set_text(&self, node: NodeId, text: &str) {
        if let Some(element) = self.element(node) {
            element.set_text_content(Some(text));
        }
    }

    fn field_value(&self, node: NodeId) -> Option<String> {
        let element = self.element(node)?;
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            return Some(input.value());
        }
        element
            .dyn_ref::<HtmlTextAreaElement>()
            .map(HtmlTextAreaElement::value)
    }
}

impl Viewport for DomHost {
    fn scroll_top(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn height(&self) -> f64 {
        self.window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    fn width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        let opts = ScrollToOptions::new();
        opts.set_top(top);
        opts.set_behavior(match behavior {
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
        });
        self.window.scroll_to_with_scroll_to_options(&opts);
    }
}

impl Location for DomHost {
    fn fragment(&self) -> Option<String> {
        let hash = self.window.location().hash().ok()?;
        let id = hash.strip_prefix('#').unwrap_or(&hash);
        (!id.is_empty()).then(|| id.to_owned())
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn replace_fragment(&self, id: &str) {
        let Ok(history) = self.window.history() else {
            return;
        };
        let url = format!("#{id}");
        if let Err(err) = history.replace_state_with_url(&JsValue::NULL, "", Some(&url)) {
            siteui_core::warn!(error = ?err, "dom: history.replaceState failed");
        }
    }
}

impl VisibilityObserver for DomHost {
    fn observe(&self, node: NodeId) {
        if let (Some(observer), Some(element)) = (self.observer.borrow().as_ref(), self.element(node))
        {
            observer.observe(&element);
        }
    }

    fn unobserve(&self, node: NodeId) {
        if let (Some(observer), Some(element)) = (self.observer.borrow().as_ref(), self.element(node))
        {
            observer.unobserve(&element);
        }
    }

    fn disconnect(&self) {
        if let Some(observer) = self.observer.borrow().as_ref() {
            observer.disconnect();
        }
    }
}

impl SelectionCopy for DomHost {
    fn copy_selection(&self, field: NodeId) -> Result<(), ClipboardError> {
        let element = self.element(field).ok_or(ClipboardError::NotAvailable)?;
        let selection = self.window.get_selection().ok().flatten();

        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            let _ = input.focus();
            input.select();
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            let _ = area.focus();
            area.select();
        } else if let Some(selection) = selection.as_ref() {
            selection
                .select_all_children(&element)
                .map_err(|err| ClipboardError::WriteFailed(js_error_text(&err)))?;
        }

        let html = self
            .document
            .dyn_ref::<HtmlDocument>()
            .ok_or(ClipboardError::NotAvailable)?;
        let copied = html
            .exec_command("copy")
            .map_err(|err| ClipboardError::WriteFailed(js_error_text(&err)))?;
        if let Some(selection) = selection {
            let _ = selection.remove_all_ranges();
        }
        if copied {
            Ok(())
        } else {
            Err(ClipboardError::WriteFailed(
                "execCommand(\"copy\") returned false".to_owned(),
            ))
        }
    }
}

/// Map a rejected `writeText` promise to a clipboard error.
pub(crate) fn clipboard_error(err: &JsValue) -> ClipboardError {
    let name = Reflect::get(err, &JsValue::from_str("name"))
        .ok()
        .and_then(|v| v.as_string());
    match name.as_deref() {
        Some("NotAllowedError" | "SecurityError") => ClipboardError::Denied(js_error_text(err)),
        _ => ClipboardError::WriteFailed(js_error_text(err)),
    }
}

pub(crate) fn js_error_text(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| format!("{err:?}"))
}
