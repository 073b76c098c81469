#![forbid(unsafe_code)]

//! Options accepted by `SiteInteractions::mount`.
//!
//! The JSON object carries the controller configuration (see
//! [`SiteConfig`]) plus the selectors used to find the TOC and copy markup:
//!
//! ```
//! use siteui_web::MountOptions;
//!
//! let opts = MountOptions::from_json(r##"{
//!     "reveal": { "threshold": 0.15 },
//!     "selectors": { "toc_overlay": "#docs-toc" }
//! }"##).unwrap();
//! assert_eq!(opts.config.reveal.threshold, 0.15);
//! assert_eq!(opts.selectors.toc_overlay, "#docs-toc");
//! assert_eq!(opts.selectors.copy_button, "[data-copy]");
//! ```

use serde::Deserialize;
use siteui_core::config::TocConfig;
use siteui_core::{ConfigError, HostCapabilities, SiteConfig};

/// Markup selectors for the interactive parts of a page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// The collapsible navigation overlay.
    pub toc_overlay: String,
    /// The control that opens and closes the overlay.
    pub toc_toggle: String,
    /// Copy buttons. Each carries `data-copy="<selector of source>"`.
    pub copy_button: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            toc_overlay: "[data-toc]".to_owned(),
            toc_toggle: "[data-toc-toggle]".to_owned(),
            copy_button: "[data-copy]".to_owned(),
        }
    }
}

/// Parsed `mount` options.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MountOptions {
    #[serde(flatten)]
    pub config: SiteConfig,
    pub selectors: Selectors,
}

impl MountOptions {
    /// Parse and validate. An empty string yields the defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let trimmed = json.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let opts: Self =
            serde_json::from_str(trimmed).map_err(|err| ConfigError::Parse(err.to_string()))?;
        opts.config.validate()?;
        Ok(opts)
    }

    /// TOC configuration adjusted for the detected environment.
    ///
    /// A reduced-motion preference forces instant scrolling.
    #[must_use]
    pub fn toc_for(&self, caps: HostCapabilities) -> TocConfig {
        let mut toc = self.config.toc.clone();
        toc.scroll_behavior = caps.scroll_behavior(toc.scroll_behavior);
        toc
    }
}

#[cfg(test)]
mod tests {
    use super::{MountOptions, Selectors};
    use pretty_assertions::assert_eq;
    use siteui_core::{ConfigError, HostCapabilities, ScrollBehavior, SiteConfig};

    #[test]
    fn empty_is_default() {
        assert_eq!(MountOptions::from_json("").unwrap(), MountOptions::default());
        assert_eq!(MountOptions::from_json("{}").unwrap(), MountOptions::default());
    }

    #[test]
    fn flattened_config_and_selectors() {
        let opts = MountOptions::from_json(
            r#"{
                "toc": { "header_offset_px": 64, "scroll_behavior": "instant" },
                "copy": { "labels": { "copied": "Done" } },
                "selectors": { "copy_button": ".copy" }
            }"#,
        )
        .unwrap();
        assert_eq!(opts.config.toc.header_offset_px, 64.0);
        assert_eq!(opts.config.toc.scroll_behavior, ScrollBehavior::Instant);
        assert_eq!(opts.config.copy.labels.copied, "Done");
        assert_eq!(opts.config.copy.labels.idle, "Copy");
        assert_eq!(
            opts.selectors,
            Selectors {
                copy_button: ".copy".to_owned(),
                ..Selectors::default()
            }
        );
    }

    #[test]
    fn invalid_values_rejected() {
        assert_eq!(
            MountOptions::from_json(r#"{ "reveal": { "threshold": 2.0 } }"#),
            Err(ConfigError::InvalidThreshold(2.0))
        );
        assert!(matches!(
            MountOptions::from_json("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn reduced_motion_forces_instant() {
        let opts = MountOptions {
            config: SiteConfig::default(),
            selectors: Selectors::default(),
        };
        assert_eq!(
            opts.toc_for(HostCapabilities::modern()).scroll_behavior,
            ScrollBehavior::Smooth
        );
        let caps = HostCapabilities::modern() | HostCapabilities::REDUCED_MOTION;
        assert_eq!(opts.toc_for(caps).scroll_behavior, ScrollBehavior::Instant);
    }
}
