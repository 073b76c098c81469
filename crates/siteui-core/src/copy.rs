#![forbid(unsafe_code)]

//! Copy-to-clipboard control with a selection fallback and a timed label.
//!
//! # Flow
//!
//! ```text
//! copy(v) ──▶ AwaitWrite(ticket) ──host writes──▶ resolve_write(ticket, Ok)  ──▶ Copied
//!   │                                            resolve_write(ticket, Err) ──▶ fallback
//!   └─ no async clipboard ───────────────────────────────────────────────────▶ fallback
//! fallback: select field + copy ──▶ Copied | Failed
//! Copied | Failed ──(revert delay)──▶ Idle
//! ```
//!
//! # Invariants
//!
//! 1. `copy("")` changes nothing and schedules nothing.
//! 2. Starting a copy cancels the outstanding revert timer and supersedes any
//!    outstanding write ticket, so only the newest call sets the final label.
//! 3. At most one revert deadline exists at any time.
//! 4. The idle label is captured once, at construction.
//!
//! # Failure Modes
//!
//! - Async write rejected: recovered via the selection fallback.
//! - Fallback fails too: label shows the manual-copy hint, then reverts.

use core::time::Duration;

use crate::clock::MonotonicClock;
use crate::config::{CopyConfig, CopyLabels};
use crate::host::{Document, NodeId, SelectionCopy};

/// Clipboard errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// No clipboard facility in this environment.
    NotAvailable,
    /// The user agent refused (permissions, missing user activation).
    Denied(String),
    /// The write was attempted and failed.
    WriteFailed(String),
}

impl std::fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAvailable => write!(f, "clipboard not available"),
            Self::Denied(msg) => write!(f, "clipboard access denied: {msg}"),
            Self::WriteFailed(msg) => write!(f, "clipboard write failed: {msg}"),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// Visible state of the copy button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CopyLabel {
    #[default]
    Idle,
    Copied,
    Failed,
}

impl CopyLabel {
    /// Value written to the button's `data-copy-state` attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Copied => "copied",
            Self::Failed => "failed",
        }
    }
}

/// Identifies one asynchronous write. Only the newest ticket is honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyTicket(u64);

/// An asynchronous write the host must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub ticket: CopyTicket,
    pub value: String,
}

/// What the host has to do after [`CopyController::copy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyStep {
    /// Nothing to copy; no state changed.
    Ignored,
    /// Write `value` asynchronously, then call
    /// [`resolve_write`](CopyController::resolve_write).
    AwaitWrite(CopyRequest),
    /// Finished synchronously with this label.
    Settled(CopyLabel),
}

/// The button and the read-only field it copies from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyNodes {
    pub button: NodeId,
    pub source: NodeId,
}

/// Drives one copy button.
pub struct CopyController<H, C>
where
    H: Document + SelectionCopy,
    C: MonotonicClock,
{
    host: H,
    clock: C,
    nodes: CopyNodes,
    labels: CopyLabels,
    delay: Duration,
    async_clipboard: bool,
    label: CopyLabel,
    revert_at: Option<Duration>,
    generation: u64,
    awaiting: Option<CopyTicket>,
}

impl<H, C> std::fmt::Debug for CopyController<H, C>
where
    H: Document + SelectionCopy,
    C: MonotonicClock,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopyController")
            .field("nodes", &self.nodes)
            .field("label", &self.label)
            .field("revert_at", &self.revert_at)
            .field("awaiting", &self.awaiting)
            .finish()
    }
}

impl<H, C> CopyController<H, C>
where
    H: Document + SelectionCopy,
    C: MonotonicClock,
{
    /// Create a controller for `nodes`.
    ///
    /// The idle label is the button's current text if it has any, otherwise
    /// the configured idle label.
    pub fn new(host: H, clock: C, nodes: CopyNodes, config: &CopyConfig, async_clipboard: bool) -> Self {
        let mut labels = config.labels.clone();
        if let Some(text) = host.text(nodes.button) {
            let text = text.trim();
            if !text.is_empty() {
                labels.idle = text.to_owned();
            }
        }
        host.set_attribute(nodes.button, "data-copy-state", CopyLabel::Idle.as_str());
        Self {
            host,
            clock,
            nodes,
            labels,
            delay: config.revert_delay(),
            async_clipboard,
            label: CopyLabel::Idle,
            revert_at: None,
            generation: 0,
            awaiting: None,
        }
    }

    /// Current label.
    #[must_use]
    pub const fn label(&self) -> CopyLabel {
        self.label
    }

    /// Text for a label.
    #[must_use]
    pub fn label_text(&self, label: CopyLabel) -> &str {
        match label {
            CopyLabel::Idle => &self.labels.idle,
            CopyLabel::Copied => &self.labels.copied,
            CopyLabel::Failed => &self.labels.failed,
        }
    }

    /// When the label will revert, if a revert is scheduled.
    #[must_use]
    pub const fn next_deadline(&self) -> Option<Duration> {
        self.revert_at
    }

    /// Whether an async write is outstanding.
    #[must_use]
    pub const fn awaiting_write(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Start copying `value`.
    pub fn copy(&mut self, value: &str) -> CopyStep {
        if value.is_empty() {
            return CopyStep::Ignored;
        }
        self.revert_at = None;
        self.generation = self.generation.wrapping_add(1);
        let ticket = CopyTicket(self.generation);

        if self.async_clipboard {
            let stale = self.awaiting.replace(ticket);
            if stale.is_some() {
                crate::debug!(stale = ?stale, "copy: superseding outstanding write");
            }
            crate::debug!(bytes = value.len(), "copy: async write requested");
            return CopyStep::AwaitWrite(CopyRequest {
                ticket,
                value: value.to_owned(),
            });
        }

        self.awaiting = None;
        let label = self.fallback(&ClipboardError::NotAvailable);
        CopyStep::Settled(label)
    }

    /// Copy whatever the source field currently holds (its value, or its
    /// text if it is not a form field).
    pub fn copy_from_source(&mut self) -> CopyStep {
        let value = self
            .host
            .field_value(self.nodes.source)
            .filter(|v| !v.is_empty())
            .or_else(|| self.host.text(self.nodes.source))
            .unwrap_or_default();
        self.copy(&value)
    }

    /// Report the outcome of an async write. Stale tickets are ignored and
    /// return `None`.
    pub fn resolve_write(
        &mut self,
        ticket: CopyTicket,
        result: Result<(), ClipboardError>,
    ) -> Option<CopyLabel> {
        if self.awaiting != Some(ticket) {
            crate::trace!(ticket = ticket.0, "copy: stale write result ignored");
            return None;
        }
        self.awaiting = None;
        let label = match result {
            Ok(()) => {
                self.settle(CopyLabel::Copied);
                CopyLabel::Copied
            }
            Err(err) => self.fallback(&err),
        };
        Some(label)
    }

    /// Revert the label if its deadline has passed. Returns `true` if it
    /// reverted.
    pub fn tick(&mut self) -> bool {
        let Some(deadline) = self.revert_at else {
            return false;
        };
        if self.clock.now_mono() < deadline {
            return false;
        }
        self.revert_at = None;
        self.apply(CopyLabel::Idle);
        crate::trace!("copy: label reverted");
        true
    }

    /// Cancel the timer and any outstanding write, and restore the idle label.
    pub fn teardown(&mut self) {
        self.revert_at = None;
        self.awaiting = None;
        self.generation = self.generation.wrapping_add(1);
        if self.label != CopyLabel::Idle {
            self.apply(CopyLabel::Idle);
        }
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn fallback(&mut self, reason: &ClipboardError) -> CopyLabel {
        crate::warn!(reason = %reason, "copy: falling back to selection copy");
        let label = match self.host.copy_selection(self.nodes.source) {
            Ok(()) => CopyLabel::Copied,
            Err(err) => {
                crate::warn!(error = %err, "copy: selection fallback failed");
                CopyLabel::Failed
            }
        };
        self.settle(label);
        label
    }

    fn settle(&mut self, label: CopyLabel) {
        self.apply(label);
        self.revert_at = Some(self.clock.now_mono().saturating_add(self.delay));
    }

    fn apply(&mut self, label: CopyLabel) {
        self.label = label;
        let text = self.label_text(label).to_owned();
        self.host.set_text(self.nodes.button, &text);
        self.host
            .set_attribute(self.nodes.button, "data-copy-state", label.as_str());
        crate::debug!(label = label.as_str(), "copy: label");
    }
}

impl<H, C> Drop for CopyController<H, C>
where
    H: Document + SelectionCopy,
    C: MonotonicClock,
{
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::{ClipboardError, CopyController, CopyLabel, CopyNodes, CopyStep};
    use crate::clock::DeterministicClock;
    use crate::config::CopyConfig;
    use crate::host::Document;
    use crate::memory::MemoryPage;
    use core::time::Duration;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    const REVERT: Duration = Duration::from_millis(1400);

    struct Fixture {
        page: Rc<MemoryPage>,
        clock: Rc<DeterministicClock>,
        nodes: CopyNodes,
    }

    fn fixture() -> Fixture {
        let page = Rc::new(MemoryPage::new(1000.0, 800.0));
        let nodes = CopyNodes {
            button: page.add_button("Copy"),
            source: page.add_field("ABC123"),
        };
        Fixture {
            page,
            clock: Rc::new(DeterministicClock::new()),
            nodes,
        }
    }

    fn controller(
        f: &Fixture,
        async_clipboard: bool,
    ) -> CopyController<Rc<MemoryPage>, Rc<DeterministicClock>> {
        CopyController::new(
            Rc::clone(&f.page),
            Rc::clone(&f.clock),
            f.nodes,
            &CopyConfig::default(),
            async_clipboard,
        )
    }

    fn button_text(f: &Fixture) -> Option<String> {
        f.page.text(f.nodes.button)
    }

    #[test]
    fn empty_value_is_ignored() {
        let f = fixture();
        let mut copy = controller(&f, true);
        assert_eq!(copy.copy(""), CopyStep::Ignored);
        assert_eq!(copy.label(), CopyLabel::Idle);
        assert_eq!(copy.next_deadline(), None);
        assert!(!copy.awaiting_write());
    }

    #[test]
    fn async_success_then_revert_after_delay() {
        let f = fixture();
        let mut copy = controller(&f, true);
        let CopyStep::AwaitWrite(req) = copy.copy("ABC123") else {
            panic!("expected async write");
        };
        assert_eq!(req.value, "ABC123");
        assert_eq!(copy.resolve_write(req.ticket, Ok(())), Some(CopyLabel::Copied));
        assert_eq!(button_text(&f).as_deref(), Some("Copied"));
        assert_eq!(copy.next_deadline(), Some(REVERT));

        f.clock.advance(REVERT - Duration::from_millis(1));
        assert!(!copy.tick());
        assert_eq!(copy.label(), CopyLabel::Copied);

        f.clock.advance(Duration::from_millis(1));
        assert!(copy.tick());
        assert_eq!(copy.label(), CopyLabel::Idle);
        assert_eq!(button_text(&f).as_deref(), Some("Copy"));
        assert_eq!(copy.next_deadline(), None);
    }

    #[test]
    fn rejected_write_falls_back_to_selection() {
        let f = fixture();
        let mut copy = controller(&f, true);
        let CopyStep::AwaitWrite(req) = copy.copy("XYZ") else {
            panic!("expected async write");
        };
        let label = copy.resolve_write(req.ticket, Err(ClipboardError::Denied("no gesture".into())));
        assert_eq!(label, Some(CopyLabel::Copied));
        assert_eq!(f.page.selection_copies(), vec![f.nodes.source]);
    }

    #[test]
    fn both_paths_failing_shows_hint_then_reverts() {
        let f = fixture();
        f.page
            .set_selection_result(Err(ClipboardError::WriteFailed("execCommand".into())));
        let mut copy = controller(&f, true);
        let CopyStep::AwaitWrite(req) = copy.copy("XYZ") else {
            panic!("expected async write");
        };
        let label = copy.resolve_write(req.ticket, Err(ClipboardError::NotAvailable));
        assert_eq!(label, Some(CopyLabel::Failed));
        assert_eq!(button_text(&f).as_deref(), Some("Press Ctrl+C"));
        assert_eq!(
            f.page.attribute(f.nodes.button, "data-copy-state").as_deref(),
            Some("failed")
        );
        f.clock.advance(REVERT);
        assert!(copy.tick());
        assert_eq!(button_text(&f).as_deref(), Some("Copy"));
    }

    #[test]
    fn missing_async_clipboard_settles_synchronously() {
        let f = fixture();
        let mut copy = controller(&f, false);
        assert_eq!(copy.copy("ABC123"), CopyStep::Settled(CopyLabel::Copied));
        assert_eq!(copy.next_deadline(), Some(REVERT));
    }

    #[test]
    fn second_copy_restarts_the_single_timer() {
        let f = fixture();
        let mut copy = controller(&f, false);
        copy.copy("one");
        f.clock.advance(Duration::from_millis(1000));
        copy.copy("two");
        assert_eq!(copy.next_deadline(), Some(Duration::from_millis(2400)));

        // The first call's deadline passes without a revert.
        f.clock.set(Duration::from_millis(1400));
        assert!(!copy.tick());
        assert_eq!(copy.label(), CopyLabel::Copied);

        f.clock.set(Duration::from_millis(2400));
        assert!(copy.tick());
        assert!(!copy.tick());
    }

    #[test]
    fn stale_write_result_is_ignored() {
        let f = fixture();
        f.page
            .set_selection_result(Err(ClipboardError::WriteFailed("blocked".into())));
        let mut copy = controller(&f, true);
        let CopyStep::AwaitWrite(first) = copy.copy("one") else {
            panic!("expected async write");
        };
        let CopyStep::AwaitWrite(second) = copy.copy("two") else {
            panic!("expected async write");
        };
        assert_eq!(copy.resolve_write(first.ticket, Err(ClipboardError::NotAvailable)), None);
        assert_eq!(copy.label(), CopyLabel::Idle);
        assert_eq!(copy.resolve_write(second.ticket, Ok(())), Some(CopyLabel::Copied));
    }

    #[test]
    fn copy_cancels_timer_while_write_outstanding() {
        let f = fixture();
        let mut copy = controller(&f, true);
        let CopyStep::AwaitWrite(req) = copy.copy("one") else {
            panic!("expected async write");
        };
        copy.resolve_write(req.ticket, Ok(()));
        assert!(copy.next_deadline().is_some());
        let _ = copy.copy("two");
        assert_eq!(copy.next_deadline(), None);
        f.clock.advance(REVERT);
        assert!(!copy.tick());
    }

    #[test]
    fn idle_label_captured_from_button_once() {
        let page = Rc::new(MemoryPage::new(1000.0, 800.0));
        let nodes = CopyNodes {
            button: page.add_button("  Copy address "),
            source: page.add_field("ABC123"),
        };
        let clock = Rc::new(DeterministicClock::new());
        let mut copy = CopyController::new(
            Rc::clone(&page),
            Rc::clone(&clock),
            nodes,
            &CopyConfig::default(),
            false,
        );
        copy.copy("ABC123");
        // A click while showing "Copied" must not capture it as the idle text.
        copy.copy("ABC123");
        clock.advance(REVERT);
        copy.tick();
        assert_eq!(page.text(nodes.button).as_deref(), Some("Copy address"));
    }

    #[test]
    fn copy_from_source_reads_field_then_text() {
        let f = fixture();
        let mut copy = controller(&f, true);
        let CopyStep::AwaitWrite(req) = copy.copy_from_source() else {
            panic!("expected async write");
        };
        assert_eq!(req.value, "ABC123");

        f.page.set_field_value(f.nodes.source, "");
        assert_eq!(copy.copy_from_source(), CopyStep::Ignored);
    }

    #[test]
    fn teardown_restores_idle_and_drops_outstanding_work() {
        let f = fixture();
        let mut copy = controller(&f, true);
        let CopyStep::AwaitWrite(req) = copy.copy("one") else {
            panic!("expected async write");
        };
        copy.teardown();
        assert_eq!(copy.resolve_write(req.ticket, Ok(())), None);
        assert_eq!(copy.next_deadline(), None);

        let mut copy = controller(&f, false);
        copy.copy("one");
        drop(copy);
        assert_eq!(button_text(&f).as_deref(), Some("Copy"));
    }
}
