#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Array;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    AddEventListenerOptions, Element, Event, EventTarget, IntersectionObserver,
    HtmlAnchorElement, IntersectionObserverEntry, IntersectionObserverInit, KeyboardEvent,
    PointerEvent, Window,
};

use siteui_core::copy::CopyRequest;
use siteui_core::event::ListenPhase;
use siteui_core::host::VisibilityObserver;
use siteui_core::lifecycle::Scope;
use siteui_core::{
    ClipboardError, CopyController, CopyNodes, CopyStep, HostCapabilities, InstantClock, KeyCode,
    MonotonicClock, NavigateOutcome, PageEvent, RevealController, TocController, TocNodes,
    VisibilityEntry,
};

use crate::dom::{DomHost, clipboard_error};
use crate::links::{DocumentUrl, LinkAction, classify_link};
use crate::options::MountOptions;
use crate::schedule::{FrameRequest, Timeout};
use crate::timing::timeout_millis;

type Host = Rc<DomHost>;
type RevealSlot = Rc<RefCell<Option<RevealController<Host>>>>;
type SharedToc = Rc<RefCell<TocController<Host>>>;
type SharedCopy = Rc<RefCell<CopyController<Host, InstantClock>>>;

/// Page interaction layer: reveal-on-scroll, TOC overlay and copy buttons.
///
/// `mount` wires every controller to the markup under a root element and
/// `unmount` releases every listener, observer, frame request and timer it
/// acquired. Mounting again first unmounts.
#[wasm_bindgen]
pub struct SiteInteractions {
    mounted: Option<Mounted>,
}

impl Default for SiteInteractions {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl SiteInteractions {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { mounted: None }
    }

    /// Mount under `root` (the document element if omitted).
    ///
    /// `options` is a JSON string; see `MountOptions`. Invalid options are
    /// logged and replaced by the defaults. Fails only when there is no
    /// window or document.
    pub fn mount(&mut self, root: Option<Element>, options: Option<String>) -> Result<(), JsValue> {
        self.unmount();

        let opts = parse_options(options.as_deref().unwrap_or(""));
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let root = match root {
            Some(root) => root,
            None => document
                .document_element()
                .ok_or_else(|| JsValue::from_str("document has no root element"))?,
        };

        self.mounted = Some(Mounted::new(window, document, &root, &opts));
        Ok(())
    }

    /// Release everything acquired by `mount`. Safe to call repeatedly.
    pub fn unmount(&mut self) {
        if self.mounted.take().is_some() {
            siteui_core::debug!("unmount: released");
        }
    }

    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Whether the TOC overlay is open.
    #[wasm_bindgen(js_name = tocOpen)]
    pub fn toc_open(&self) -> bool {
        self.mounted
            .as_ref()
            .and_then(|m| m.toc.as_ref())
            .is_some_and(|toc| toc.borrow().state().is_open())
    }

    /// Navigate to an element id, exactly as a TOC link click would.
    /// Returns `false` if there is no TOC or the id is unknown.
    pub fn navigate(&mut self, anchor: &str) -> bool {
        let Some(mounted) = self.mounted.as_ref() else {
            return false;
        };
        let Some(toc) = mounted.toc.as_ref() else {
            return false;
        };
        let outcome = toc.borrow_mut().navigate(anchor);
        if outcome == NavigateOutcome::Scheduled {
            mounted.frames.request();
            return true;
        }
        false
    }

    /// Detected capability bits (`HostCapabilities`), for diagnostics.
    pub fn capabilities(&self) -> u8 {
        self.mounted.as_ref().map_or(0, |m| m.caps.bits())
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn parse_options(json: &str) -> MountOptions {
    MountOptions::from_json(json).unwrap_or_else(|err| {
        siteui_core::warn!(error = %err, "mount: invalid options, using defaults");
        MountOptions::default()
    })
}

struct Mounted {
    host: Host,
    caps: HostCapabilities,
    toc: Option<SharedToc>,
    frames: Rc<FrameRequest>,
    scope: Scope,
}

impl Mounted {
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn new(window: Window, document: web_sys::Document, root: &Element, opts: &MountOptions) -> Self {
        let host: Host = Rc::new(DomHost::new(window.clone(), document.clone()));
        let caps = host.detect_capabilities();
        let frames = Rc::new(FrameRequest::new(window));
        let mut scope = Scope::new();

        mount_reveal(&host, root, opts, caps, &mut scope);
        let toc = mount_toc(&host, &document, root, opts, caps, &frames, &mut scope);
        let copies = mount_copies(&host, root, opts, caps, &mut scope);

        siteui_core::info!(
            caps = caps.bits(),
            toc = toc.is_some(),
            copies,
            "mount: page interactions ready"
        );
        Self {
            host,
            caps,
            toc,
            frames,
            scope,
        }
    }
}

impl Drop for Mounted {
    fn drop(&mut self) {
        self.scope.release();
        self.host.release();
    }
}

fn query_all(root: &Element, selector: &str) -> Vec<Element> {
    let Ok(list) = root.query_selector_all(selector) else {
        siteui_core::warn!(selector, "mount: invalid selector");
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// Register `handler` for `kind` on `target` and defer its removal.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn listen(
    scope: &mut Scope,
    target: &EventTarget,
    kind: &'static str,
    phase: ListenPhase,
    handler: impl FnMut(Event) + 'static,
) {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    let capture = phase.use_capture();
    let opts = AddEventListenerOptions::new();
    opts.set_capture(capture);
    if let Err(err) = target.add_event_listener_with_callback_and_add_event_listener_options(
        kind,
        closure.as_ref().unchecked_ref(),
        &opts,
    ) {
        siteui_core::warn!(kind, error = ?err, "mount: addEventListener failed");
        return;
    }
    let target = target.clone();
    scope.defer(move || {
        let _ = target.remove_event_listener_with_callback_and_bool(
            kind,
            closure.as_ref().unchecked_ref(),
            capture,
        );
        drop(closure);
    });
}

// ── Reveal ──────────────────────────────────────────────────────────────

fn mount_reveal(
    host: &Host,
    root: &Element,
    opts: &MountOptions,
    caps: HostCapabilities,
    scope: &mut Scope,
) {
    let reveal_cfg = &opts.config.reveal;
    let nodes: Vec<_> = query_all(root, &reveal_cfg.selector)
        .into_iter()
        .map(|el| host.intern(el))
        .collect();
    if nodes.is_empty() {
        return;
    }

    let slot: RevealSlot = Rc::new(RefCell::new(None));
    let observer = if caps.contains(HostCapabilities::VISIBILITY_OBSERVER) {
        observe_visibility(host, &slot, reveal_cfg.threshold, scope)
    } else {
        None
    };
    let controller = RevealController::init(Rc::clone(host), nodes, reveal_cfg, observer);
    *slot.borrow_mut() = Some(controller);

    scope.defer(move || {
        let controller = slot.borrow_mut().take();
        if let Some(mut reveal) = controller {
            reveal.teardown();
        }
    });
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn observe_visibility(
    host: &Host,
    slot: &RevealSlot,
    threshold: f64,
    scope: &mut Scope,
) -> Option<Rc<dyn VisibilityObserver>> {
    let weak_slot = Rc::downgrade(slot);
    let weak_host = Rc::downgrade(host);
    let callback = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
        move |entries: Array, _observer: IntersectionObserver| {
            let (Some(slot), Some(host)) = (weak_slot.upgrade(), weak_host.upgrade()) else {
                return;
            };
            let batch: Vec<VisibilityEntry> = entries
                .iter()
                .filter_map(|value| value.dyn_into::<IntersectionObserverEntry>().ok())
                .filter_map(|entry| {
                    let node = host.lookup(&entry.target())?;
                    Some(VisibilityEntry::new(
                        node,
                        entry.intersection_ratio(),
                        entry.is_intersecting(),
                    ))
                })
                .collect();
            if let Some(reveal) = slot.borrow_mut().as_mut() {
                reveal.on_visibility(&batch);
            }
        },
    );

    let init = IntersectionObserverInit::new();
    init.set_threshold(&JsValue::from_f64(threshold));
    match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
        Ok(observer) => {
            host.set_observer(Some(observer));
            scope.defer(move || drop(callback));
            Some(Rc::clone(host) as Rc<dyn VisibilityObserver>)
        }
        Err(err) => {
            siteui_core::warn!(error = ?err, "mount: IntersectionObserver unavailable");
            None
        }
    }
}

// ── TOC ─────────────────────────────────────────────────────────────────

fn mount_toc(
    host: &Host,
    document: &web_sys::Document,
    root: &Element,
    opts: &MountOptions,
    caps: HostCapabilities,
    frames: &Rc<FrameRequest>,
    scope: &mut Scope,
) -> Option<SharedToc> {
    let overlay = root.query_selector(&opts.selectors.toc_overlay).ok().flatten()?;
    let toggle = root.query_selector(&opts.selectors.toc_toggle).ok().flatten();
    let nodes = TocNodes {
        overlay: host.intern(overlay.clone()),
        toggle: toggle.as_ref().map(|el| host.intern(el.clone())),
    };
    let toc: SharedToc = Rc::new(RefCell::new(TocController::new(
        Rc::clone(host),
        nodes,
        &opts.toc_for(caps),
    )));

    let weak_toc = Rc::downgrade(&toc);
    let weak_frames = Rc::downgrade(frames);
    frames.set_callback(Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
        let Some(frames) = weak_frames.upgrade() else {
            return;
        };
        frames.fired();
        let Some(toc) = weak_toc.upgrade() else {
            return;
        };
        let again = {
            let mut toc = toc.borrow_mut();
            toc.on_frame();
            toc.needs_frame()
        };
        if again {
            frames.request();
        }
    }));

    {
        let toc = Rc::clone(&toc);
        let frames = Rc::clone(frames);
        scope.defer(move || {
            frames.cancel();
            toc.borrow_mut().teardown();
        });
    }

    // Dismissal runs in the capture phase so content that stops propagation
    // cannot keep the overlay open.
    {
        let toc = Rc::clone(&toc);
        listen(scope, document.as_ref(), "keydown", ListenPhase::Capture, move |event| {
            if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
                let code = KeyCode::from_dom_key(&key.key());
                toc.borrow_mut().on_event(&PageEvent::Key(code));
            }
        });
    }
    {
        let toc = Rc::clone(&toc);
        listen(scope, document.as_ref(), "pointerdown", ListenPhase::Capture, move |event| {
            if let Some(pointer) = event.dyn_ref::<PointerEvent>() {
                let down = PageEvent::pointer_down(
                    f64::from(pointer.client_x()),
                    f64::from(pointer.client_y()),
                );
                toc.borrow_mut().on_event(&down);
            }
        });
    }
    if let Some(toggle) = toggle {
        let toc = Rc::clone(&toc);
        listen(scope, toggle.as_ref(), "click", ListenPhase::Bubble, move |_event| {
            toc.borrow_mut().toggle();
        });
    }
    {
        let toc = Rc::clone(&toc);
        let frames = Rc::clone(frames);
        let window = host.window().clone();
        listen(scope, overlay.as_ref(), "click", ListenPhase::Bubble, move |event| {
            let Some(link) = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .and_then(|el| el.closest("a[href]").ok().flatten())
            else {
                return;
            };
            let (Some(href), Some(anchor)) =
                (link.get_attribute("href"), link.dyn_ref::<HtmlAnchorElement>())
            else {
                return;
            };
            let target = DocumentUrl::new(anchor.origin(), anchor.pathname(), anchor.search());
            let LinkAction::InPage(id) = classify_link(&href, &target, &current_url(&window))
            else {
                return;
            };
            // In-page links never fall through to the browser, even for
            // unknown ids, so the fragment is only ever replaced by the
            // controller.
            event.prevent_default();
            if toc.borrow_mut().navigate(&id) == NavigateOutcome::Scheduled {
                frames.request();
            }
        });
    }

    Some(toc)
}

fn current_url(window: &Window) -> DocumentUrl {
    let location = window.location();
    DocumentUrl::new(
        location.origin().unwrap_or_default(),
        location.pathname().unwrap_or_default(),
        location.search().unwrap_or_default(),
    )
}

// ── Copy ────────────────────────────────────────────────────────────────

fn mount_copies(
    host: &Host,
    root: &Element,
    opts: &MountOptions,
    caps: HostCapabilities,
    scope: &mut Scope,
) -> usize {
    let mut mounted = 0;
    for button in query_all(root, &opts.selectors.copy_button) {
        let source = button
            .get_attribute("data-copy")
            .filter(|selector| !selector.trim().is_empty())
            .and_then(|selector| host.query(&selector));
        let Some(source) = source else {
            siteui_core::debug!("mount: copy button without a resolvable source, skipped");
            continue;
        };
        mount_copy(host, button, source, opts, caps, scope);
        mounted += 1;
    }
    mounted
}

fn mount_copy(
    host: &Host,
    button: Element,
    source: Element,
    opts: &MountOptions,
    caps: HostCapabilities,
    scope: &mut Scope,
) {
    let nodes = CopyNodes {
        button: host.intern(button.clone()),
        source: host.intern(source),
    };
    let clock = InstantClock::new();
    let copy: SharedCopy = Rc::new(RefCell::new(CopyController::new(
        Rc::clone(host),
        clock,
        nodes,
        &opts.config.copy,
        caps.contains(HostCapabilities::ASYNC_CLIPBOARD),
    )));
    let timer = Rc::new(Timeout::new(host.window().clone()));

    {
        let weak_copy = Rc::downgrade(&copy);
        let weak_timer = Rc::downgrade(&timer);
        timer.set_callback(Closure::<dyn FnMut()>::new(move || {
            let (Some(copy), Some(timer)) = (weak_copy.upgrade(), weak_timer.upgrade()) else {
                return;
            };
            timer.fired();
            let mut copy = copy.borrow_mut();
            copy.tick();
            sync_timer(&copy, &timer, &clock);
        }));
    }

    {
        let copy = Rc::clone(&copy);
        let timer = Rc::clone(&timer);
        scope.defer(move || {
            timer.cancel();
            copy.borrow_mut().teardown();
        });
    }

    let host = Rc::clone(host);
    listen(scope, button.as_ref(), "click", ListenPhase::Bubble, move |_event| {
        let step = copy.borrow_mut().copy_from_source();
        if let CopyStep::AwaitWrite(request) = step {
            start_write(&host, &copy, &timer, clock, request);
        }
        sync_timer(&copy.borrow(), &timer, &clock);
    });
}

/// Hand the write to `navigator.clipboard` and feed the outcome back.
fn start_write(
    host: &Host,
    copy: &SharedCopy,
    timer: &Rc<Timeout>,
    clock: InstantClock,
    request: CopyRequest,
) {
    let CopyRequest { ticket, value } = request;
    let Some(clipboard) = host.clipboard() else {
        copy.borrow_mut()
            .resolve_write(ticket, Err(ClipboardError::NotAvailable));
        return;
    };
    let promise = clipboard.write_text(&value);
    let weak_copy = Rc::downgrade(copy);
    let weak_timer = Rc::downgrade(timer);
    spawn_local(async move {
        let result = JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|err| clipboard_error(&err));
        let (Some(copy), Some(timer)) = (weak_copy.upgrade(), weak_timer.upgrade()) else {
            return;
        };
        let mut copy = copy.borrow_mut();
        if copy.resolve_write(ticket, result).is_some() {
            sync_timer(&copy, &timer, &clock);
        }
    });
}

/// Point the browser timeout at the controller's revert deadline.
fn sync_timer(copy: &CopyController<Host, InstantClock>, timer: &Timeout, clock: &InstantClock) {
    match copy.next_deadline() {
        Some(deadline) => {
            timer.arm(timeout_millis(deadline.saturating_sub(clock.now_mono())));
        }
        None => timer.clear(),
    }
}
