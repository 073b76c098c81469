#![forbid(unsafe_code)]

//! One-shot reveal-on-scroll.
//!
//! [`RevealController`] watches a fixed set of elements and applies the reveal
//! class to each one the first time enough of it becomes visible.
//!
//! # Invariants
//!
//! 1. `Pending -> Revealed` is the only transition; nothing is un-revealed.
//! 2. The class is applied at most once per element, and a revealed element
//!    is unobserved in the same step.
//! 3. Without a [`VisibilityObserver`], every element is revealed during
//!    [`init`](RevealController::init).
//! 4. [`teardown`](RevealController::teardown) is idempotent and safe with an
//!    empty element set.
//!
//! # Failure Modes
//!
//! - Elements that disappear from the page are left pending; sampling skips
//!   them.
//! - Duplicate nodes passed to `init` are observed once.

use std::rc::Rc;

use crate::config::RevealConfig;
use crate::host::{Document, NodeId, Viewport, VisibilityObserver};
use crate::lifecycle::Scope;

/// Allowance for observers that report a crossing slightly below the exact
/// threshold due to subpixel rounding.
const RATIO_EPSILON: f64 = 1e-6;

/// Lifecycle of a single reveal-eligible element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    /// Waiting to cross the threshold.
    Pending,
    /// Marker applied; terminal.
    Revealed,
}

/// One visibility report for an observed element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityEntry {
    pub node: NodeId,
    /// Visible fraction in `[0, 1]`.
    pub ratio: f64,
    /// Whether the element touches the viewport at all.
    pub is_intersecting: bool,
}

impl VisibilityEntry {
    #[must_use]
    pub const fn new(node: NodeId, ratio: f64, is_intersecting: bool) -> Self {
        Self {
            node,
            ratio,
            is_intersecting,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RevealItem {
    node: NodeId,
    state: RevealState,
}

/// Applies a one-way "revealed" class to elements as they scroll into view.
pub struct RevealController<D: Document> {
    document: D,
    class: String,
    threshold: f64,
    items: Vec<RevealItem>,
    observer: Option<Rc<dyn VisibilityObserver>>,
    scope: Scope,
}

impl<D: Document> std::fmt::Debug for RevealController<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealController")
            .field("class", &self.class)
            .field("threshold", &self.threshold)
            .field("pending", &self.pending_count())
            .field("revealed", &self.revealed_count())
            .field("observing", &self.is_observing())
            .finish()
    }
}

impl<D: Document> RevealController<D> {
    /// Start observing `nodes`.
    ///
    /// Elements that already carry the reveal class are recorded as revealed
    /// and not observed. Passing `observer = None` means the environment has no
    /// visibility observation, so everything is revealed immediately.
    pub fn init(
        document: D,
        nodes: impl IntoIterator<Item = NodeId>,
        config: &RevealConfig,
        observer: Option<Rc<dyn VisibilityObserver>>,
    ) -> Self {
        let mut controller = Self {
            document,
            class: config.class.clone(),
            threshold: config.threshold.clamp(0.0, 1.0),
            items: Vec::new(),
            observer: None,
            scope: Scope::new(),
        };

        for node in nodes {
            if controller.items.iter().any(|item| item.node == node) {
                continue;
            }
            let state = if controller.document.has_class(node, &controller.class) {
                RevealState::Revealed
            } else {
                RevealState::Pending
            };
            controller.items.push(RevealItem { node, state });
        }

        if controller.items.is_empty() {
            crate::debug!("reveal: no eligible elements");
            return controller;
        }

        match observer {
            None => {
                crate::info!(
                    count = controller.items.len(),
                    "reveal: visibility observation unavailable, revealing all"
                );
                let pending: Vec<NodeId> = controller.pending_nodes().collect();
                for node in pending {
                    controller.mark_revealed(node);
                }
            }
            Some(observer) => {
                for node in controller.pending_nodes() {
                    observer.observe(node);
                }
                let release = Rc::clone(&observer);
                controller.scope.defer(move || release.disconnect());
                crate::debug!(
                    count = controller.pending_count(),
                    threshold = controller.threshold,
                    "reveal: observing"
                );
                controller.observer = Some(observer);
            }
        }
        controller
    }

    /// Apply a batch of visibility reports. Returns the nodes revealed by this
    /// batch, in report order.
    pub fn on_visibility(&mut self, entries: &[VisibilityEntry]) -> Vec<NodeId> {
        let mut revealed = Vec::new();
        for entry in entries {
            if self.state(entry.node) != Some(RevealState::Pending) {
                continue;
            }
            if self.crosses(entry) {
                self.mark_revealed(entry.node);
                revealed.push(entry.node);
            }
        }
        revealed
    }

    /// Compute visibility for every pending element from its bounding box and
    /// apply it. For hosts that drive reveal from scroll events instead of an
    /// observer.
    pub fn sample<V: Viewport + ?Sized>(&mut self, viewport: &V) -> Vec<NodeId> {
        let view = viewport.rect();
        let entries: Vec<VisibilityEntry> = self
            .pending_nodes()
            .filter_map(|node| {
                let rect = self.document.bounding_rect(node)?;
                Some(VisibilityEntry::new(
                    node,
                    rect.visible_fraction(&view),
                    rect.intersection(&view).is_some(),
                ))
            })
            .collect();
        self.on_visibility(&entries)
    }

    /// Release the observer. Pending elements stay pending.
    pub fn teardown(&mut self) {
        if self.observer.take().is_some() {
            crate::debug!(pending = self.pending_count(), "reveal: teardown");
        }
        self.scope.release();
    }

    /// State of a tracked element.
    #[must_use]
    pub fn state(&self, node: NodeId) -> Option<RevealState> {
        self.items
            .iter()
            .find(|item| item.node == node)
            .map(|item| item.state)
    }

    /// Number of elements still waiting.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.count(RevealState::Pending)
    }

    /// Number of revealed elements.
    #[must_use]
    pub fn revealed_count(&self) -> usize {
        self.count(RevealState::Revealed)
    }

    /// Whether an observer subscription is live.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }

    /// The effective threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    fn count(&self, state: RevealState) -> usize {
        self.items.iter().filter(|item| item.state == state).count()
    }

    fn pending_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items
            .iter()
            .filter(|item| item.state == RevealState::Pending)
            .map(|item| item.node)
    }

    fn crosses(&self, entry: &VisibilityEntry) -> bool {
        if !entry.is_intersecting {
            return false;
        }
        entry.ratio + RATIO_EPSILON >= self.threshold
    }

    fn mark_revealed(&mut self, node: NodeId) {
        let Some(item) = self.items.iter_mut().find(|item| item.node == node) else {
            return;
        };
        if item.state == RevealState::Revealed {
            return;
        }
        item.state = RevealState::Revealed;
        self.document.set_class(node, &self.class, true);
        if let Some(observer) = &self.observer {
            observer.unobserve(node);
        }
        crate::trace!(node = node.0, "reveal: revealed");
    }
}
