#![forbid(unsafe_code)]

//! Host boundary.
//!
//! Controllers never touch a global `document` or `window`. Everything they
//! need from the page is reached through the traits in this module, which the
//! embedding environment implements (`siteui-web` for browsers, [`MemoryPage`]
//! for tests and headless use).
//!
//! All methods take `&self`: DOM handles are interior-mutable and the page is
//! shared by every controller mounted on it.
//!
//! [`MemoryPage`]: crate::memory::MemoryPage

use bitflags::bitflags;
use serde::Deserialize;

use crate::copy::ClipboardError;
use crate::geometry::Rect;

/// Opaque handle to a page element.
///
/// Hosts hand these out; controllers only compare and pass them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// How a programmatic scroll moves the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    /// Animated scroll.
    #[default]
    Smooth,
    /// Jump immediately.
    Instant,
}

bitflags! {
    /// Optional facilities detected in the execution environment.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HostCapabilities: u8 {
        /// Visibility observation (`IntersectionObserver`).
        const VISIBILITY_OBSERVER = 0b0001;
        /// Asynchronous clipboard writes (`navigator.clipboard.writeText`).
        const ASYNC_CLIPBOARD     = 0b0010;
        /// The user asked for reduced motion.
        const REDUCED_MOTION      = 0b0100;
    }
}

impl HostCapabilities {
    /// Everything a current evergreen browser provides.
    #[must_use]
    pub const fn modern() -> Self {
        Self::VISIBILITY_OBSERVER.union(Self::ASYNC_CLIPBOARD)
    }

    /// Resolve the effective scroll behavior for a configured preference.
    #[must_use]
    pub const fn scroll_behavior(self, preferred: ScrollBehavior) -> ScrollBehavior {
        if self.contains(Self::REDUCED_MOTION) {
            ScrollBehavior::Instant
        } else {
            preferred
        }
    }
}

/// Element queries and mutations.
pub trait Document {
    /// Resolve an element by its `id` attribute.
    fn resolve_anchor(&self, id: &str) -> Option<NodeId>;

    /// Viewport-relative bounding box, or `None` if the element is gone.
    fn bounding_rect(&self, node: NodeId) -> Option<Rect>;

    /// Add (`present == true`) or remove a class.
    fn set_class(&self, node: NodeId, class: &str, present: bool);

    /// Check for a class.
    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Set an attribute.
    fn set_attribute(&self, node: NodeId, name: &str, value: &str);

    /// Text content of an element.
    fn text(&self, node: NodeId) -> Option<String>;

    /// Replace the text content of an element.
    fn set_text(&self, node: NodeId, text: &str);

    /// Current value of a form field (`<input>`, `<textarea>`), if the element
    /// is one.
    fn field_value(&self, node: NodeId) -> Option<String>;
}

/// Window scroll state.
pub trait Viewport {
    /// Current vertical scroll offset of the document.
    fn scroll_top(&self) -> f64;

    /// Visible height of the viewport.
    fn height(&self) -> f64;

    /// Visible width of the viewport.
    fn width(&self) -> f64;

    /// Scroll the document so its vertical offset becomes `top`.
    fn scroll_to(&self, top: f64, behavior: ScrollBehavior);

    /// The viewport as a rectangle in its own coordinates.
    fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width(), self.height())
    }
}

/// URL fragment access.
pub trait Location {
    /// Current fragment without the leading `#`, if any.
    fn fragment(&self) -> Option<String>;

    /// Replace the current history entry with one whose fragment is `id`.
    ///
    /// Must not push a new entry and must not trigger the browser's own
    /// jump-to-anchor scroll.
    fn replace_fragment(&self, id: &str);
}

/// Visibility observation facility.
///
/// The host reports crossings back through
/// [`RevealController::on_visibility`](crate::reveal::RevealController::on_visibility).
pub trait VisibilityObserver {
    /// Start observing an element.
    fn observe(&self, node: NodeId);

    /// Stop observing a single element.
    fn unobserve(&self, node: NodeId);

    /// Stop observing everything.
    fn disconnect(&self);
}

/// Synchronous selection-based copy (`select()` + `execCommand("copy")`).
pub trait SelectionCopy {
    /// Focus and select the field, then copy the selection.
    fn copy_selection(&self, field: NodeId) -> Result<(), ClipboardError>;
}

impl<T: Document + ?Sized> Document for std::rc::Rc<T> {
    fn resolve_anchor(&self, id: &str) -> Option<NodeId> {
        (**self).resolve_anchor(id)
    }
    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        (**self).bounding_rect(node)
    }
    fn set_class(&self, node: NodeId, class: &str, present: bool) {
        (**self).set_class(node, class, present);
    }
    fn has_class(&self, node: NodeId, class: &str) -> bool {
        (**self).has_class(node, class)
    }
    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        (**self).set_attribute(node, name, value);
    }
    fn text(&self, node: NodeId) -> Option<String> {
        (**self).text(node)
    }
    fn set_text(&self, node: NodeId, text: &str) {
        (**self).set_text(node, text);
    }
    fn field_value(&self, node: NodeId) -> Option<String> {
        (**self).field_value(node)
    }
}

impl<T: Viewport + ?Sized> Viewport for std::rc::Rc<T> {
    fn scroll_top(&self) -> f64 {
        (**self).scroll_top()
    }
    fn height(&self) -> f64 {
        (**self).height()
    }
    fn width(&self) -> f64 {
        (**self).width()
    }
    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        (**self).scroll_to(top, behavior);
    }
}

impl<T: Location + ?Sized> Location for std::rc::Rc<T> {
    fn fragment(&self) -> Option<String> {
        (**self).fragment()
    }
    fn replace_fragment(&self, id: &str) {
        (**self).replace_fragment(id);
    }
}

impl<T: VisibilityObserver + ?Sized> VisibilityObserver for std::rc::Rc<T> {
    fn observe(&self, node: NodeId) {
        (**self).observe(node);
    }
    fn unobserve(&self, node: NodeId) {
        (**self).unobserve(node);
    }
    fn disconnect(&self) {
        (**self).disconnect();
    }
}

impl<T: SelectionCopy + ?Sized> SelectionCopy for std::rc::Rc<T> {
    fn copy_selection(&self, field: NodeId) -> Result<(), ClipboardError> {
        (**self).copy_selection(field)
    }
}
