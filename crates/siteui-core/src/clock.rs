#![forbid(unsafe_code)]

//! Monotonic time sources.
//!
//! Controllers never read wall-clock time directly. The host injects a
//! [`MonotonicClock`]; tests use [`DeterministicClock`] and advance it by hand.

use core::cell::Cell;
use core::time::Duration;

/// Host-provided monotonic time.
pub trait MonotonicClock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now_mono(&self) -> Duration;
}

/// Deterministic monotonic clock controlled by the host.
///
/// Interior-mutable so the same clock can be shared by a controller and the
/// driver that advances it.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Cell<Duration>,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
        }
    }

    /// Set current monotonic time.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&self, dt: Duration) {
        self.now.set(self.now.get().saturating_add(dt));
    }
}

impl MonotonicClock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now.get()
    }
}

/// Real monotonic clock backed by `performance.now()` on wasm and
/// `std::time::Instant` elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct InstantClock {
    origin: web_time::Instant,
}

impl InstantClock {
    /// Create a clock whose origin is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: web_time::Instant::now(),
        }
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for InstantClock {
    fn now_mono(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for std::rc::Rc<C> {
    fn now_mono(&self) -> Duration {
        (**self).now_mono()
    }
}

#[cfg(test)]
mod tests {
    use super::{DeterministicClock, InstantClock, MonotonicClock};
    use core::time::Duration;

    #[test]
    fn deterministic_clock_advances_and_saturates() {
        let clock = DeterministicClock::new();
        assert_eq!(clock.now_mono(), Duration::ZERO);
        clock.advance(Duration::from_millis(16));
        clock.advance(Duration::from_millis(16));
        assert_eq!(clock.now_mono(), Duration::from_millis(32));
        clock.set(Duration::MAX);
        clock.advance(Duration::from_secs(1));
        assert_eq!(clock.now_mono(), Duration::MAX);
    }

    #[test]
    fn instant_clock_is_monotonic() {
        let clock = InstantClock::new();
        let a = clock.now_mono();
        let b = clock.now_mono();
        assert!(b >= a);
    }
}
