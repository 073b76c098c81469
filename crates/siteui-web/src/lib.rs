#![forbid(unsafe_code)]

//! Browser binding for `siteui-core`.
//!
//! On `wasm32` this crate exports [`SiteInteractions`] to JavaScript. It
//! implements the core host traits over `web-sys`, pumps animation frames for
//! the TOC controller, arms `setTimeout` for copy label reverts, and bridges
//! `navigator.clipboard.writeText` promises back into the copy controller.
//!
//! ```js
//! import init, { SiteInteractions } from "siteui-web";
//! await init();
//! const site = new SiteInteractions();
//! site.mount(document.body, JSON.stringify({ toc: { header_offset_px: 96 } }));
//! // ...
//! site.unmount();
//! ```

pub mod links;
pub mod options;
pub mod registry;
pub mod timing;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod schedule;
#[cfg(target_arch = "wasm32")]
mod wasm;

pub use links::{DocumentUrl, LinkAction, classify_link};
pub use options::{MountOptions, Selectors};
pub use registry::NodeRegistry;

#[cfg(target_arch = "wasm32")]
pub use wasm::SiteInteractions;

/// Outside `wasm32` there is no page to mount on; this placeholder keeps the
/// workspace building natively.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct SiteInteractions;

#[cfg(not(target_arch = "wasm32"))]
impl SiteInteractions {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }

    /// Nothing is ever mounted outside a browser.
    pub fn is_mounted(&self) -> bool {
        false
    }
}
