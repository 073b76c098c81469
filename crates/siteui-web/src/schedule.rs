#![forbid(unsafe_code)]

//! Browser scheduling primitives: animation frames and one-shot timeouts.
//!
//! Both hold at most one outstanding request. Re-requesting while one is in
//! flight is a no-op for frames and a re-arm for timeouts.

use std::cell::{Cell, RefCell};

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::Window;

/// A single-slot `requestAnimationFrame` pump.
pub(crate) struct FrameRequest {
    window: Window,
    handle: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl FrameRequest {
    pub(crate) fn new(window: Window) -> Self {
        Self {
            window,
            handle: Cell::new(None),
            callback: RefCell::new(None),
        }
    }

    /// Install the frame callback. It must call [`FrameRequest::fired`]
    /// before doing anything else.
    pub(crate) fn set_callback(&self, callback: Closure<dyn FnMut(f64)>) {
        *self.callback.borrow_mut() = Some(callback);
    }

    /// Ask for the next frame unless one is already pending.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub(crate) fn request(&self) {
        if self.handle.get().is_some() {
            return;
        }
        let callback = self.callback.borrow();
        let Some(callback) = callback.as_ref() else {
            return;
        };
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(id) => self.handle.set(Some(id)),
            Err(err) => {
                siteui_core::warn!(error = ?err, "schedule: requestAnimationFrame failed");
            }
        }
    }

    /// Mark the outstanding request as delivered.
    pub(crate) fn fired(&self) {
        self.handle.set(None);
    }

    /// Cancel any pending frame and drop the callback.
    pub(crate) fn cancel(&self) {
        if let Some(id) = self.handle.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        self.callback.borrow_mut().take();
    }
}

/// A single-slot `setTimeout`.
pub(crate) struct Timeout {
    window: Window,
    handle: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Timeout {
    pub(crate) fn new(window: Window) -> Self {
        Self {
            window,
            handle: Cell::new(None),
            callback: RefCell::new(None),
        }
    }

    pub(crate) fn set_callback(&self, callback: Closure<dyn FnMut()>) {
        *self.callback.borrow_mut() = Some(callback);
    }

    /// Fire after `delay_ms`, replacing any earlier arm.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub(crate) fn arm(&self, delay_ms: i32) {
        self.clear();
        let callback = self.callback.borrow();
        let Some(callback) = callback.as_ref() else {
            return;
        };
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                delay_ms.max(0),
            ) {
            Ok(id) => self.handle.set(Some(id)),
            Err(err) => {
                siteui_core::warn!(error = ?err, "schedule: setTimeout failed");
            }
        }
    }

    pub(crate) fn fired(&self) {
        self.handle.set(None);
    }

    /// Clear the pending timeout, keeping the callback.
    pub(crate) fn clear(&self) {
        if let Some(id) = self.handle.take() {
            self.window.clear_timeout_with_handle(id);
        }
    }

    pub(crate) fn cancel(&self) {
        self.clear();
        self.callback.borrow_mut().take();
    }
}
