//! Frames that follow rendered content instead of a fixed coordinate.
//!
//! An invisible anchor element sits exactly where the content is; its live
//! rect is copied onto the paired frame image every pass.

use fnv::FnvHashMap;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Inflation matching the border padding baked into the frame artwork.
pub const DEFAULT_FRAME_SCALE: f64 = 1.5;
/// Horizontal nudge applied with the default inflation.
pub const DEFAULT_FRAME_NUDGE_X: f64 = -2.0;
/// Extra height so the artwork covers the anchor's bottom border.
pub const BORDER_FUDGE_PX: f64 = 2.0;
pub const DEFAULT_FRAME_SRC: &str = "/frames/frame-02.png";

fn default_src() -> String {
    DEFAULT_FRAME_SRC.to_string()
}

fn default_nudge() -> f64 {
    DEFAULT_FRAME_NUDGE_X
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorFrameConfig {
    /// Value of the anchor's `data-frame-anchor` attribute.
    pub name: String,
    #[serde(default = "default_src")]
    pub src: String,
    /// Uniform inflation; overridden per axis by `scale_x`/`scale_y`.
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub scale_x: Option<f64>,
    #[serde(default)]
    pub scale_y: Option<f64>,
    #[serde(default = "default_nudge")]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
}

impl AnchorFrameConfig {
    pub fn new(name: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            src: src.into(),
            scale: None,
            scale_x: None,
            scale_y: None,
            offset_x: DEFAULT_FRAME_NUDGE_X,
            offset_y: 0.0,
        }
    }

    /// Config used for anchors nobody registered.
    pub fn fallback(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_FRAME_SRC)
    }

    pub fn resolved_scale(&self) -> DVec2 {
        let uniform = self.scale.unwrap_or(DEFAULT_FRAME_SCALE);
        DVec2::new(
            self.scale_x.unwrap_or(uniform),
            self.scale_y.unwrap_or(uniform),
        )
    }

    /// DOM id of the frame image paired with this anchor.
    pub fn frame_element_id(&self) -> String {
        format!("frame-{}", self.name)
    }
}

pub fn default_anchor_frames() -> Vec<AnchorFrameConfig> {
    [
        ("carousel-frame-anchor", "/frames/frame-02.png"),
        ("carousel-frame-anchor-estudios", "/frames/frame-03.png"),
        ("frame-anchor-policia", "/policia-marco.png"),
        ("frame-anchor-medicina", "/medicina-marco.png"),
        ("carousel-frame-anchor-hobbies", "/frames/frame-05.png"),
        ("carousel-frame-anchor-indep", "/frames/frame-06.png"),
        ("carousel-frame-anchor-ilun", "/frames/frame-07.png"),
        ("carousel-frame-anchor-pedida", "/frames/frame-04.png"),
    ]
    .into_iter()
    .map(|(name, src)| AnchorFrameConfig::new(name, src))
    .collect()
}

/// Lookup table from anchor name to frame config.
#[derive(Clone, Debug, Default)]
pub struct AnchorFrames {
    by_name: FnvHashMap<String, AnchorFrameConfig>,
}

impl AnchorFrames {
    pub fn new(configs: impl IntoIterator<Item = AnchorFrameConfig>) -> Self {
        Self {
            by_name: configs.into_iter().map(|c| (c.name.clone(), c)).collect(),
        }
    }

    /// Registered config for `name`, or the default artwork.
    pub fn config_for(&self, name: &str) -> AnchorFrameConfig {
        self.by_name
            .get(name)
            .cloned()
            .unwrap_or_else(|| AnchorFrameConfig::fallback(name))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Live bounding rect of an anchor, viewport coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnchorRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorPlacement {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub translate: DVec2,
    pub scale: DVec2,
}

/// Geometry for the frame over `rect`. `None` means the anchor has no
/// usable box yet and the frame must stay hidden.
pub fn place_anchor_frame(rect: &AnchorRect, config: &AnchorFrameConfig) -> Option<AnchorPlacement> {
    let finite = [rect.left, rect.top, rect.width, rect.height]
        .iter()
        .all(|v| v.is_finite());
    if !finite || rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    Some(AnchorPlacement {
        left: rect.left,
        top: rect.top,
        width: rect.width,
        height: rect.height + BORDER_FUDGE_PX,
        translate: DVec2::new(config.offset_x, config.offset_y),
        scale: config.resolved_scale(),
    })
}
