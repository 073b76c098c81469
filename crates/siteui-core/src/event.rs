#![forbid(unsafe_code)]

//! Canonical page input events.
//!
//! The host translates DOM events into these types before handing them to a
//! controller. Only the events the controllers react to are modeled.
//!
//! # Design Notes
//!
//! - Pointer coordinates are viewport-relative CSS pixels (`clientX`/`clientY`).
//! - Dismissal listeners are registered in the capture phase on every platform;
//!   see [`ListenPhase`].

/// Canonical page event.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// A pointer went down somewhere in the document.
    PointerDown(PointerEvent),

    /// A key was pressed.
    Key(KeyCode),
}

impl PageEvent {
    /// Convenience constructor for a pointer-down at viewport coordinates.
    #[must_use]
    pub const fn pointer_down(x: f64, y: f64) -> Self {
        Self::PointerDown(PointerEvent { x, y })
    }

    /// Check if this event asks the page to dismiss transient UI.
    #[must_use]
    pub const fn is_cancel_key(&self) -> bool {
        matches!(self, Self::Key(KeyCode::Escape))
    }
}

/// A pointer-down at a viewport position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Horizontal position (`clientX`).
    pub x: f64,
    /// Vertical position (`clientY`).
    pub y: f64,
}

/// Keys the controllers distinguish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCode {
    /// Escape / cancel.
    Escape,
    /// Any other key, by its DOM `key` value.
    Other(String),
}

impl KeyCode {
    /// Map a DOM `KeyboardEvent.key` value.
    ///
    /// Both the standard `"Escape"` and the legacy `"Esc"` spellings map to
    /// [`KeyCode::Escape`].
    #[must_use]
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => Self::Escape,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// DOM event propagation phase a listener is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenPhase {
    /// Runs before target handlers; sees events even if a descendant stops
    /// propagation.
    #[default]
    Capture,
    /// Runs after target handlers.
    Bubble,
}

impl ListenPhase {
    /// Value for the `useCapture` argument of `addEventListener`.
    #[must_use]
    pub const fn use_capture(self) -> bool {
        matches!(self, Self::Capture)
    }
}
