#![forbid(unsafe_code)]

//! Mount-time configuration.
//!
//! Every field has a default matching the site's markup contract, so an empty
//! JSON object (or no options at all) yields a working configuration.
//!
//! ```
//! use siteui_core::config::SiteConfig;
//!
//! let cfg = SiteConfig::from_json(r#"{ "toc": { "header_offset_px": 72 } }"#).unwrap();
//! assert_eq!(cfg.toc.header_offset_px, 72.0);
//! assert_eq!(cfg.reveal.class, "in-view");
//! ```

use core::time::Duration;

use serde::Deserialize;

use crate::host::ScrollBehavior;

/// Default reveal threshold (visible fraction).
pub const DEFAULT_REVEAL_THRESHOLD: f64 = 0.2;
/// Default fixed-header reservation in CSS pixels.
pub const DEFAULT_HEADER_OFFSET_PX: f64 = 96.0;
/// Default number of frame boundaries to wait before measuring a scroll target.
pub const DEFAULT_SETTLE_FRAMES: u8 = 2;
/// Default delay before a copy label reverts.
pub const DEFAULT_REVERT_MS: u64 = 1400;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Input was not valid JSON for this schema.
    Parse(String),
    /// Reveal threshold outside `[0, 1]` (or NaN).
    InvalidThreshold(f64),
    /// Header offset negative or not finite.
    InvalidOffset(f64),
    /// Settle frame count of zero.
    InvalidSettleFrames,
    /// Revert delay of zero.
    InvalidDelay,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "invalid config: {msg}"),
            Self::InvalidThreshold(v) => write!(f, "reveal threshold must be in [0, 1] (got {v})"),
            Self::InvalidOffset(v) => {
                write!(f, "header offset must be finite and non-negative (got {v})")
            }
            Self::InvalidSettleFrames => write!(f, "settle_frames must be at least 1"),
            Self::InvalidDelay => write!(f, "revert_ms must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration for all controllers on a page.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub reveal: RevealConfig,
    pub toc: TocConfig,
    pub copy: CopyConfig,
}

/// Reveal-on-scroll settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Selector for reveal-eligible elements.
    pub selector: String,
    /// Class applied once an element is revealed.
    pub class: String,
    /// Visible fraction that triggers the reveal.
    pub threshold: f64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            selector: "[data-reveal]".to_owned(),
            class: "in-view".to_owned(),
            threshold: DEFAULT_REVEAL_THRESHOLD,
        }
    }
}

/// Navigation overlay settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    /// Pixels reserved for the fixed header above a scroll target.
    pub header_offset_px: f64,
    /// Preferred scroll animation.
    pub scroll_behavior: ScrollBehavior,
    /// Frame boundaries to wait after collapsing before measuring.
    pub settle_frames: u8,
    /// Class carried by the overlay while open.
    pub open_class: String,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            header_offset_px: DEFAULT_HEADER_OFFSET_PX,
            scroll_behavior: ScrollBehavior::Smooth,
            settle_frames: DEFAULT_SETTLE_FRAMES,
            open_class: "is-open".to_owned(),
        }
    }
}

/// Copy control settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    /// Milliseconds before the label reverts.
    pub revert_ms: u64,
    pub labels: CopyLabels,
}

impl CopyConfig {
    /// The revert delay as a [`Duration`].
    #[must_use]
    pub const fn revert_delay(&self) -> Duration {
        Duration::from_millis(self.revert_ms)
    }
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            revert_ms: DEFAULT_REVERT_MS,
            labels: CopyLabels::default(),
        }
    }
}

/// Button texts for each copy state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CopyLabels {
    pub idle: String,
    pub copied: String,
    /// Shown when both the async write and the selection fallback failed.
    pub failed: String,
}

impl Default for CopyLabels {
    fn default() -> Self {
        Self {
            idle: "Copy".to_owned(),
            copied: "Copied".to_owned(),
            failed: "Press Ctrl+C".to_owned(),
        }
    }
}

impl SiteConfig {
    /// Parse and validate a JSON options object. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let trimmed = json.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let cfg: Self =
            serde_json::from_str(trimmed).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.reveal.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        let offset = self.toc.header_offset_px;
        if !offset.is_finite() || offset < 0.0 {
            return Err(ConfigError::InvalidOffset(offset));
        }
        if self.toc.settle_frames == 0 {
            return Err(ConfigError::InvalidSettleFrames);
        }
        if self.copy.revert_ms == 0 {
            return Err(ConfigError::InvalidDelay);
        }
        Ok(())
    }

    /// Override the reveal threshold.
    #[must_use]
    pub fn with_reveal_threshold(mut self, threshold: f64) -> Self {
        self.reveal.threshold = threshold;
        self
    }

    /// Override the header offset.
    #[must_use]
    pub fn with_header_offset(mut self, px: f64) -> Self {
        self.toc.header_offset_px = px;
        self
    }

    /// Override the preferred scroll behavior.
    #[must_use]
    pub fn with_scroll_behavior(mut self, behavior: ScrollBehavior) -> Self {
        self.toc.scroll_behavior = behavior;
        self
    }

    /// Override the copy revert delay.
    #[must_use]
    pub fn with_revert_delay(mut self, delay: Duration) -> Self {
        self.copy.revert_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SiteConfig};
    use crate::host::ScrollBehavior;
    use core::time::Duration;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_input_is_default() {
        assert_eq!(SiteConfig::from_json("").unwrap(), SiteConfig::default());
        assert_eq!(SiteConfig::from_json("{}").unwrap(), SiteConfig::default());
    }

    #[test]
    fn defaults_match_site_contract() {
        let cfg = SiteConfig::default();
        assert_eq!(cfg.reveal.selector, "[data-reveal]");
        assert_eq!(cfg.reveal.class, "in-view");
        assert_eq!(cfg.reveal.threshold, 0.2);
        assert_eq!(cfg.toc.header_offset_px, 96.0);
        assert_eq!(cfg.toc.settle_frames, 2);
        assert_eq!(cfg.copy.revert_delay(), Duration::from_millis(1400));
        assert_eq!(cfg.copy.labels.failed, "Press Ctrl+C");
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = SiteConfig::from_json(
            r#"{
                "reveal": { "threshold": 0.15 },
                "toc": { "scroll_behavior": "instant" },
                "copy": { "labels": { "copied": "Done" } }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.reveal.threshold, 0.15);
        assert_eq!(cfg.reveal.class, "in-view");
        assert_eq!(cfg.toc.scroll_behavior, ScrollBehavior::Instant);
        assert_eq!(cfg.copy.labels.copied, "Done");
        assert_eq!(cfg.copy.labels.idle, "Copy");
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(
            SiteConfig::from_json(r#"{ "reveal": { "threshold": 1.5 } }"#),
            Err(ConfigError::InvalidThreshold(1.5))
        );
        assert_eq!(
            SiteConfig::from_json(r#"{ "toc": { "header_offset_px": -4 } }"#),
            Err(ConfigError::InvalidOffset(-4.0))
        );
        assert_eq!(
            SiteConfig::from_json(r#"{ "toc": { "settle_frames": 0 } }"#),
            Err(ConfigError::InvalidSettleFrames)
        );
        assert_eq!(
            SiteConfig::from_json(r#"{ "copy": { "revert_ms": 0 } }"#),
            Err(ConfigError::InvalidDelay)
        );
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = SiteConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("invalid config"));
    }

    #[test]
    fn builders_override() {
        let cfg = SiteConfig::default()
            .with_reveal_threshold(0.5)
            .with_header_offset(64.0)
            .with_scroll_behavior(ScrollBehavior::Instant)
            .with_revert_delay(Duration::from_millis(900));
        assert_eq!(cfg.reveal.threshold, 0.5);
        assert_eq!(cfg.toc.header_offset_px, 64.0);
        assert_eq!(cfg.toc.scroll_behavior, ScrollBehavior::Instant);
        assert_eq!(cfg.copy.revert_ms, 900);
        assert!(cfg.validate().is_ok());
    }
}
