#![forbid(unsafe_code)]

//! Core: page interaction controllers and the host boundary they run against.
//!
//! Three independent controllers, composed only by sharing a page host:
//!
//! - [`RevealController`]: one-shot reveal of content blocks as they scroll
//!   into view.
//! - [`TocController`]: navigation overlay state and header-compensated
//!   anchor scrolling.
//! - [`CopyController`]: clipboard copy with a selection fallback and a timed
//!   label revert.
//!
//! Design goals:
//! - **Host-driven**: the embedding environment pushes events, frame
//!   boundaries and time; controllers never reach for globals.
//! - **Deterministic**: everything runs single-threaded against injected
//!   traits, so [`MemoryPage`] and [`DeterministicClock`] reproduce any
//!   interleaving in tests.
//! - **Scoped resources**: subscriptions are released on teardown and on drop.

pub mod anchor;
pub mod clock;
pub mod config;
pub mod copy;
pub mod event;
pub mod geometry;
pub mod host;
pub mod lifecycle;
pub mod logging;
pub mod memory;
pub mod reveal;
pub mod toc;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};

pub use clock::{DeterministicClock, InstantClock, MonotonicClock};
pub use config::{ConfigError, SiteConfig};
pub use copy::{ClipboardError, CopyController, CopyLabel, CopyNodes, CopyStep};
pub use event::{KeyCode, PageEvent};
pub use host::{HostCapabilities, NodeId, ScrollBehavior};
pub use memory::MemoryPage;
pub use reveal::{RevealController, RevealState, VisibilityEntry};
pub use toc::{NavigateOutcome, TocController, TocNodes, TocState};
