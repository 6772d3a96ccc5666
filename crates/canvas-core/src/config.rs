//! Tunable configuration.
//!
//! Every pixel constant here was tuned against a handful of target devices;
//! treat them as knobs, not invariants.

use crate::anchors::AnchorFrameConfig;
use crate::frames::{default_frames, FrameRegistry, OverlayFrame};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DESIGN_WIDTH: f64 = 1920.0;
pub const DEFAULT_MAGNIFICATION: f64 = 1.21;
pub const DEFAULT_NARROW_VIEWPORT_MAX_PX: f64 = 768.0;
pub const DEFAULT_CONTAINER_BUFFER_PX: f64 = 24.0;
pub const DEFAULT_FALLBACK_MIN_HEIGHT_PX: f64 = 2400.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("overlay frame id must not be empty")]
    EmptyId,
    #[error("duplicate overlay frame id `{0}`")]
    DuplicateId(String),
    #[error("frame `{id}` has an invalid `{field}`")]
    InvalidNumber { id: String, field: &'static str },
    #[error("design parameter `{0}` must be finite and positive")]
    InvalidDesign(&'static str),
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DesignConfig {
    /// Authored canvas width in pixels.
    pub design_width: f64,
    /// Global enlargement of the design; the canvas is laid out at
    /// `design_width / magnification`.
    pub magnification: f64,
    /// Viewports at or below this width use frame mobile offsets.
    pub narrow_viewport_max_px: f64,
    /// Extra height added when an internal scroll container is used.
    pub container_buffer_px: f64,
    /// Minimum height used when the final-section sentinel is missing.
    pub fallback_min_height_px: f64,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            design_width: DEFAULT_DESIGN_WIDTH,
            magnification: DEFAULT_MAGNIFICATION,
            narrow_viewport_max_px: DEFAULT_NARROW_VIEWPORT_MAX_PX,
            container_buffer_px: DEFAULT_CONTAINER_BUFFER_PX,
            fallback_min_height_px: DEFAULT_FALLBACK_MIN_HEIGHT_PX,
        }
    }
}

impl DesignConfig {
    #[inline]
    pub fn effective_design_width(&self) -> f64 {
        self.design_width / self.magnification
    }

    #[inline]
    pub fn is_narrow(&self, viewport_width: f64) -> bool {
        viewport_width <= self.narrow_viewport_max_px
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !positive(self.design_width) {
            return Err(ConfigError::InvalidDesign("designWidth"));
        }
        if !positive(self.magnification) {
            return Err(ConfigError::InvalidDesign("magnification"));
        }
        if !non_negative(self.narrow_viewport_max_px) {
            return Err(ConfigError::InvalidDesign("narrowViewportMaxPx"));
        }
        if !non_negative(self.container_buffer_px) {
            return Err(ConfigError::InvalidDesign("containerBufferPx"));
        }
        if !non_negative(self.fallback_min_height_px) {
            return Err(ConfigError::InvalidDesign("fallbackMinHeightPx"));
        }
        Ok(())
    }
}

/// Raw shape of the `#canvas-config` JSON document.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSiteConfig {
    design: DesignConfig,
    frames: Option<Vec<OverlayFrame>>,
    anchors: Option<Vec<AnchorFrameConfig>>,
}

/// Everything the layout core can be tuned with.
#[derive(Clone, Debug)]
pub struct SiteConfig {
    pub design: DesignConfig,
    pub frames: FrameRegistry,
    pub anchors: Vec<AnchorFrameConfig>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            design: DesignConfig::default(),
            frames: crate::frames::default_registry(),
            anchors: crate::anchors::default_anchor_frames(),
        }
    }
}

impl SiteConfig {
    /// Parse a JSON override. Sections left out keep their built-in values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawSiteConfig = serde_json::from_str(json)?;
        raw.design.validate()?;
        let frames = FrameRegistry::new(raw.frames.unwrap_or_else(default_frames))?;
        let anchors = raw
            .anchors
            .unwrap_or_else(crate::anchors::default_anchor_frames);
        Ok(Self {
            design: raw.design,
            frames,
            anchors,
        })
    }

    /// Like [`SiteConfig::from_json`] but never fails: an invalid document is
    /// logged and replaced by the defaults.
    pub fn from_json_or_default(json: Option<&str>) -> Self {
        match json.map(str::trim).filter(|s| !s.is_empty()) {
            None => Self::default(),
            Some(text) => Self::from_json(text).unwrap_or_else(|e| {
                log::warn!("[config] ignoring canvas config: {}", e);
                Self::default()
            }),
        }
    }
}
