#![forbid(unsafe_code)]

//! Table-of-contents overlay: open/closed state and anchor navigation.
//!
//! [`TocController`] is an explicit two-state machine plus a single
//! [`PendingNavigation`] slot. Navigation collapses the overlay first and then
//! waits a fixed number of frame boundaries before measuring the target, so
//! the collapse has been laid out and the measured position is not stale.
//!
//! The host drives frames: after any call, if [`needs_frame`] is true it
//! requests an animation frame and calls [`on_frame`] from it.
//!
//! ```text
//!            toggle()                     navigate(id)
//!   Closed ───────────▶ Open     any ─────────────────▶ Closed + pending(id, N)
//!          ◀───────────          on_frame() × N ──────▶ scroll_to(top − offset), #id
//!    toggle() | Escape | outside pointer
//! ```
//!
//! # Invariants
//!
//! 1. At most one navigation is pending; a new one replaces it.
//! 2. Navigation always leaves the overlay `Closed`.
//! 3. An anchor that does not resolve never moves the viewport or the URL.
//! 4. Scroll targets are clamped to `>= 0`.
//! 5. Dismissal while `Closed` does nothing.
//!
//! [`needs_frame`]: TocController::needs_frame
//! [`on_frame`]: TocController::on_frame

use crate::anchor::anchor_from_href;
use crate::config::TocConfig;
use crate::event::PageEvent;
use crate::host::{Document, Location, NodeId, ScrollBehavior, Viewport};

/// Overlay open/closed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TocState {
    #[default]
    Closed,
    Open,
}

impl TocState {
    /// Check if the overlay is open.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Why the state changed. Used for logging and by hosts that animate
/// differently per cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCause {
    Toggle,
    OutsidePointer,
    CancelKey,
    Navigate,
}

/// Elements the controller needs to know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TocNodes {
    /// The collapsible panel.
    pub overlay: NodeId,
    /// The control that toggles it, if any. Pointer-downs on it are not
    /// treated as outside dismissals.
    pub toggle: Option<NodeId>,
}

/// A scroll waiting for layout to settle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNavigation {
    anchor: String,
    frames_remaining: u8,
}

impl PendingNavigation {
    /// Target anchor id.
    #[must_use]
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// Frame boundaries left before the scroll executes.
    #[must_use]
    pub const fn frames_remaining(&self) -> u8 {
        self.frames_remaining
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigateOutcome {
    /// A scroll is pending; the host must pump frames.
    Scheduled,
    /// The anchor did not resolve; nothing will scroll.
    UnknownAnchor,
}

/// A completed navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollOutcome {
    pub anchor: String,
    /// Document offset scrolled to.
    pub top: f64,
}

/// Scroll offset that puts an element `header_offset` pixels below the
/// viewport top, clamped to the start of the document.
#[must_use]
pub fn scroll_offset(scroll_top: f64, element_top: f64, header_offset: f64) -> f64 {
    (scroll_top + element_top - header_offset).max(0.0)
}

/// Owns the overlay state and in-page navigation.
#[derive(Debug)]
pub struct TocController<H> {
    host: H,
    nodes: TocNodes,
    state: TocState,
    pending: Option<PendingNavigation>,
    header_offset: f64,
    settle_frames: u8,
    behavior: ScrollBehavior,
    open_class: String,
}

impl<H: Document + Viewport + Location> TocController<H> {
    /// Create a controller in the `Closed` state and publish that state to
    /// the markup.
    pub fn new(host: H, nodes: TocNodes, config: &TocConfig) -> Self {
        let controller = Self {
            host,
            nodes,
            state: TocState::Closed,
            pending: None,
            header_offset: config.header_offset_px.max(0.0),
            settle_frames: config.settle_frames.max(1),
            behavior: config.scroll_behavior,
            open_class: config.open_class.clone(),
        };
        controller.publish();
        controller
    }

    /// Override the scroll behavior (e.g. for reduced motion).
    #[must_use]
    pub fn with_scroll_behavior(mut self, behavior: ScrollBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> TocState {
        self.state
    }

    /// The pending navigation, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingNavigation> {
        self.pending.as_ref()
    }

    /// Whether the host should deliver another frame boundary.
    #[must_use]
    pub const fn needs_frame(&self) -> bool {
        self.pending.is_some()
    }

    /// `Closed -> Open` or `Open -> Closed`.
    pub fn toggle(&mut self) {
        let next = match self.state {
            TocState::Closed => TocState::Open,
            TocState::Open => TocState::Closed,
        };
        self.transition(next, TransitionCause::Toggle);
    }

    /// Feed a page event. Returns `true` if it closed the overlay.
    pub fn on_event(&mut self, event: &PageEvent) -> bool {
        if !self.state.is_open() {
            return false;
        }
        match event {
            PageEvent::Key(_) if event.is_cancel_key() => {
                self.transition(TocState::Closed, TransitionCause::CancelKey)
            }
            PageEvent::PointerDown(p) => {
                let inside = self.hits(Some(self.nodes.overlay), p.x, p.y)
                    || self.hits(self.nodes.toggle, p.x, p.y);
                if inside {
                    return false;
                }
                self.transition(TocState::Closed, TransitionCause::OutsidePointer)
            }
            PageEvent::Key(_) => false,
        }
    }

    /// Navigate to the element with id `anchor`.
    ///
    /// Cancels any pending navigation and closes the overlay before resolving
    /// the anchor.
    pub fn navigate(&mut self, anchor: &str) -> NavigateOutcome {
        let superseded = self.pending.take().map(|pending| pending.anchor);
        if superseded.is_some() {
            crate::debug!(previous = ?superseded, next = anchor, "toc: navigation superseded");
        }
        self.transition(TocState::Closed, TransitionCause::Navigate);

        if anchor.is_empty() || self.host.resolve_anchor(anchor).is_none() {
            crate::debug!(anchor, "toc: unknown anchor, ignoring");
            return NavigateOutcome::UnknownAnchor;
        }

        self.pending = Some(PendingNavigation {
            anchor: anchor.to_owned(),
            frames_remaining: self.settle_frames,
        });
        crate::debug!(anchor, frames = self.settle_frames, "toc: navigation scheduled");
        NavigateOutcome::Scheduled
    }

    /// Navigate using a link `href` such as `#doc-install`.
    pub fn navigate_href(&mut self, href: &str) -> NavigateOutcome {
        match anchor_from_href(href) {
            Some(anchor) => self.navigate(&anchor),
            None => self.navigate(""),
        }
    }

    /// Deliver one frame boundary. Executes the pending scroll once enough
    /// frames have passed.
    pub fn on_frame(&mut self) -> Option<ScrollOutcome> {
        let pending = self.pending.as_mut()?;
        pending.frames_remaining = pending.frames_remaining.saturating_sub(1);
        if pending.frames_remaining > 0 {
            return None;
        }
        let PendingNavigation { anchor, .. } = self.pending.take()?;

        // The target may have been removed while layout settled.
        let Some(rect) = self
            .host
            .resolve_anchor(&anchor)
            .and_then(|node| self.host.bounding_rect(node))
        else {
            crate::debug!(anchor = %anchor, "toc: target vanished before scroll");
            return None;
        };

        let top = scroll_offset(self.host.scroll_top(), rect.top(), self.header_offset);
        self.host.scroll_to(top, self.behavior);
        self.host.replace_fragment(&anchor);
        crate::info!(anchor = %anchor, top, "toc: scrolled to anchor");
        Some(ScrollOutcome { anchor, top })
    }

    /// Cancel pending work. The overlay state is left as is.
    pub fn teardown(&mut self) {
        let canceled = self.pending.take().map(|pending| pending.anchor);
        if canceled.is_some() {
            crate::debug!(anchor = ?canceled, "toc: pending navigation canceled by teardown");
        }
    }

    fn hits(&self, node: Option<NodeId>, x: f64, y: f64) -> bool {
        node.and_then(|node| self.host.bounding_rect(node))
            .is_some_and(|rect| rect.contains(x, y))
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn transition(&mut self, next: TocState, cause: TransitionCause) -> bool {
        if self.state == next {
            return false;
        }
        crate::debug!(from = ?self.state, to = ?next, cause = ?cause, "toc: transition");
        self.state = next;
        self.publish();
        true
    }

    fn publish(&self) {
        let open = self.state.is_open();
        self.host.set_class(self.nodes.overlay, &self.open_class, open);
        if let Some(toggle) = self.nodes.toggle {
            self.host
                .set_attribute(toggle, "aria-expanded", if open { "true" } else { "false" });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NavigateOutcome, TocController, TocNodes, TocState, scroll_offset};
    use crate::config::TocConfig;
    use crate::event::{KeyCode, PageEvent};
    use crate::geometry::Rect;
    use crate::host::{Document, Location, ScrollBehavior, Viewport};
    use crate::memory::{MemoryPage, ScrollRecord};
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    struct Fixture {
        page: Rc<MemoryPage>,
        toc: TocController<Rc<MemoryPage>>,
        nodes: TocNodes,
    }

    fn fixture() -> Fixture {
        let page = Rc::new(MemoryPage::new(1000.0, 800.0));
        let overlay = page.add_element(None, Rect::new(20.0, 80.0, 300.0, 400.0));
        let toggle = page.add_element(None, Rect::new(900.0, 10.0, 60.0, 40.0));
        page.add_element(Some("install"), Rect::new(0.0, 2000.0, 1000.0, 400.0));
        page.add_element(Some("top"), Rect::new(0.0, 20.0, 1000.0, 100.0));
        let nodes = TocNodes {
            overlay,
            toggle: Some(toggle),
        };
        let toc = TocController::new(Rc::clone(&page), nodes, &TocConfig::default());
        Fixture { page, toc, nodes }
    }

    #[test]
    fn starts_closed_and_publishes() {
        let f = fixture();
        assert_eq!(f.toc.state(), TocState::Closed);
        assert!(!f.page.has_class(f.nodes.overlay, "is-open"));
        assert_eq!(
            f.page.attribute(f.nodes.toggle.unwrap(), "aria-expanded").as_deref(),
            Some("false")
        );
    }

    #[test]
    fn toggle_twice_round_trips() {
        let mut f = fixture();
        f.toc.toggle();
        assert_eq!(f.toc.state(), TocState::Open);
        assert!(f.page.has_class(f.nodes.overlay, "is-open"));
        f.toc.toggle();
        assert_eq!(f.toc.state(), TocState::Closed);
        assert!(!f.page.has_class(f.nodes.overlay, "is-open"));
    }

    #[test]
    fn escape_closes_only_when_open() {
        let mut f = fixture();
        assert!(!f.toc.on_event(&PageEvent::Key(KeyCode::Escape)));
        f.toc.toggle();
        assert!(!f.toc.on_event(&PageEvent::Key(KeyCode::Other("a".into()))));
        assert!(f.toc.on_event(&PageEvent::Key(KeyCode::Escape)));
        assert_eq!(f.toc.state(), TocState::Closed);
    }

    #[test]
    fn pointer_inside_overlay_or_toggle_does_not_dismiss() {
        let mut f = fixture();
        f.toc.toggle();
        assert!(!f.toc.on_event(&PageEvent::pointer_down(100.0, 200.0)));
        assert!(!f.toc.on_event(&PageEvent::pointer_down(920.0, 20.0)));
        assert_eq!(f.toc.state(), TocState::Open);
        assert!(f.toc.on_event(&PageEvent::pointer_down(600.0, 600.0)));
        assert_eq!(f.toc.state(), TocState::Closed);
    }

    #[test]
    fn navigate_waits_two_frames_then_scrolls() {
        let mut f = fixture();
        f.toc.toggle();
        assert_eq!(f.toc.navigate("install"), NavigateOutcome::Scheduled);
        assert_eq!(f.toc.state(), TocState::Closed);
        assert!(f.toc.needs_frame());

        assert_eq!(f.toc.on_frame(), None);
        assert!(f.page.scrolls().is_empty());

        let done = f.toc.on_frame().expect("scroll after second frame");
        assert_eq!(done.top, 2000.0 - 96.0);
        assert_eq!(
            f.page.scrolls(),
            vec![ScrollRecord {
                top: 1904.0,
                behavior: ScrollBehavior::Smooth
            }]
        );
        assert_eq!(f.page.fragment().as_deref(), Some("install"));
        assert!(!f.toc.needs_frame());
    }

    #[test]
    fn measurement_happens_after_collapse_settles() {
        let mut f = fixture();
        f.toc.toggle();
        f.toc.navigate("install");
        // Collapsing the overlay shifts content up by 400px during layout.
        let node = f.page.resolve_anchor("install").unwrap();
        f.page.set_rect(node, Rect::new(0.0, 1600.0, 1000.0, 400.0));
        f.toc.on_frame();
        let done = f.toc.on_frame().unwrap();
        assert_eq!(done.top, 1504.0);
    }

    #[test]
    fn unknown_anchor_is_a_no_op() {
        let mut f = fixture();
        f.page.set_scroll_top(321.0);
        assert_eq!(f.toc.navigate("nope"), NavigateOutcome::UnknownAnchor);
        assert!(!f.toc.needs_frame());
        assert_eq!(f.toc.on_frame(), None);
        assert_eq!(f.page.scroll_top(), 321.0);
        assert_eq!(f.page.fragment(), None);
    }

    #[test]
    fn new_navigation_supersedes_pending() {
        let mut f = fixture();
        f.toc.navigate("install");
        f.toc.on_frame();
        f.toc.navigate("top");
        assert_eq!(f.toc.pending().map(|p| p.anchor()), Some("top"));
        assert_eq!(f.toc.pending().map(|p| p.frames_remaining()), Some(2));
        f.toc.on_frame();
        f.toc.on_frame();
        assert_eq!(f.page.scrolls().len(), 1);
        assert_eq!(f.page.history_replacements(), vec!["top".to_owned()]);
    }

    #[test]
    fn unknown_anchor_still_cancels_pending() {
        let mut f = fixture();
        f.toc.navigate("install");
        f.toc.navigate("missing");
        assert!(!f.toc.needs_frame());
        f.toc.on_frame();
        f.toc.on_frame();
        assert!(f.page.scrolls().is_empty());
    }

    #[test]
    fn target_removed_during_settle_aborts() {
        let mut f = fixture();
        f.toc.navigate("install");
        let node = f.page.resolve_anchor("install").unwrap();
        f.page.remove_element(node);
        f.toc.on_frame();
        assert_eq!(f.toc.on_frame(), None);
        assert!(f.page.scrolls().is_empty());
        assert_eq!(f.page.fragment(), None);
    }

    #[test]
    fn scroll_target_clamps_at_zero() {
        let mut f = fixture();
        f.toc.navigate("top");
        f.toc.on_frame();
        let done = f.toc.on_frame().unwrap();
        assert_eq!(done.top, 0.0);
        assert_eq!(scroll_offset(0.0, 20.0, 96.0), 0.0);
    }

    #[test]
    fn navigate_href_parses_fragment() {
        let mut f = fixture();
        assert_eq!(f.toc.navigate_href("#install"), NavigateOutcome::Scheduled);
        assert_eq!(f.toc.navigate_href("/docs"), NavigateOutcome::UnknownAnchor);
    }

    #[test]
    fn teardown_cancels_pending() {
        let mut f = fixture();
        f.toc.navigate("install");
        f.toc.teardown();
        assert!(!f.toc.needs_frame());
        assert_eq!(f.toc.on_frame(), None);
        assert!(f.page.scrolls().is_empty());
    }

    #[test]
    fn instant_behavior_is_forwarded() {
        let f = fixture();
        let mut toc = TocController::new(Rc::clone(&f.page), f.nodes, &TocConfig::default())
            .with_scroll_behavior(ScrollBehavior::Instant);
        toc.navigate("install");
        toc.on_frame();
        toc.on_frame();
        assert_eq!(f.page.scrolls()[0].behavior, ScrollBehavior::Instant);
    }
}
