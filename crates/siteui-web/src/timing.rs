#![forbid(unsafe_code)]

//! Conversions between controller deadlines and browser timer delays.

use core::time::Duration;

/// Delay to pass to `setTimeout` so it fires no earlier than `remaining`.
///
/// Rounds up to whole milliseconds and saturates at `i32::MAX`.
#[must_use]
pub fn timeout_millis(remaining: Duration) -> i32 {
    let millis = remaining.as_nanos().div_ceil(1_000_000);
    i32::try_from(millis).unwrap_or(i32::MAX)
}
