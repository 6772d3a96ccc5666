//! Overlay frame registry.
//!
//! Each [`OverlayFrame`] describes one decorative image positioned in
//! design-canvas pixels. `x` is measured from the canvas's horizontal centre
//! line and `y` from the canvas top edge; both name the frame's centre.
//! The registry is built once at start-up and never mutated afterwards.

use crate::config::ConfigError;
use fnv::FnvHashSet;
use glam::DVec2;
use serde::{Deserialize, Serialize};

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayFrame {
    pub id: String,
    pub src: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    #[serde(default)]
    pub mobile_offset_x: Option<f64>,
    #[serde(default)]
    pub mobile_offset_y: Option<f64>,
    #[serde(default = "yes")]
    pub visible: bool,
}

impl OverlayFrame {
    /// Minimal visible frame at `(x, y)` with no explicit size.
    pub fn new(id: impl Into<String>, src: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            src: src.into(),
            x,
            y,
            width: None,
            height: None,
            scale_x: 1.0,
            scale_y: 1.0,
            mobile_offset_x: None,
            mobile_offset_y: None,
            visible: true,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    pub fn with_mobile_offset(mut self, dx: f64, dy: f64) -> Self {
        self.mobile_offset_x = Some(dx);
        self.mobile_offset_y = Some(dy);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Design-space centre, including the mobile offset when `narrow`.
    #[inline]
    pub fn effective_offset(&self, narrow: bool) -> DVec2 {
        if narrow {
            DVec2::new(
                self.x + self.mobile_offset_x.unwrap_or(0.0),
                self.y + self.mobile_offset_y.unwrap_or(0.0),
            )
        } else {
            DVec2::new(self.x, self.y)
        }
    }

    /// Bottom edge in unscaled design pixels. A frame without an explicit
    /// height contributes its centre line. A mirrored frame (negative
    /// `scale_y`) covers the same extent.
    #[inline]
    pub fn design_bottom(&self, narrow: bool) -> f64 {
        let half = self.height.unwrap_or(0.0) * self.scale_y.abs() / 2.0;
        self.effective_offset(narrow).y + half
    }

    fn check_numbers(&self) -> Result<(), ConfigError> {
        let fields = [
            ("x", Some(self.x)),
            ("y", Some(self.y)),
            ("width", self.width),
            ("height", self.height),
            ("scaleX", Some(self.scale_x)),
            ("scaleY", Some(self.scale_y)),
            ("mobileOffsetX", self.mobile_offset_x),
            ("mobileOffsetY", self.mobile_offset_y),
        ];
        for (field, value) in fields {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(ConfigError::InvalidNumber {
                        id: self.id.clone(),
                        field,
                    });
                }
            }
        }
        for (field, value) in [("width", self.width), ("height", self.height)] {
            if matches!(value, Some(v) if v < 0.0) {
                return Err(ConfigError::InvalidNumber {
                    id: self.id.clone(),
                    field,
                });
            }
        }
        Ok(())
    }
}

/// Immutable, validated set of overlay frames.
#[derive(Clone, Debug, Default)]
pub struct FrameRegistry {
    frames: Vec<OverlayFrame>,
}

impl FrameRegistry {
    pub fn new(frames: Vec<OverlayFrame>) -> Result<Self, ConfigError> {
        let mut seen = FnvHashSet::default();
        for frame in &frames {
            if frame.id.is_empty() {
                return Err(ConfigError::EmptyId);
            }
            if !seen.insert(frame.id.as_str()) {
                return Err(ConfigError::DuplicateId(frame.id.clone()));
            }
            frame.check_numbers()?;
        }
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[OverlayFrame] {
        &self.frames
    }

    pub fn visible(&self) -> impl Iterator<Item = &OverlayFrame> + '_ {
        self.frames.iter().filter(|f| f.visible)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Lowest visible bottom edge in design pixels, or `None` when nothing
    /// is visible.
    pub fn lowest_visible_bottom(&self, narrow: bool) -> Option<f64> {
        self.visible()
            .map(|f| f.design_bottom(narrow))
            .reduce(f64::max)
    }
}

/// Frames authored against the 1920px design.
pub fn default_frames() -> Vec<OverlayFrame> {
    vec![
        OverlayFrame::new("hero-flourish", "/frames/hero-flourish.png", 0.0, 210.0)
            .with_size(1400.0, 260.0),
        OverlayFrame::new("escapadas-garland", "/frames/frame-02.png", 338.0, 1284.0)
            .with_size(600.0, 400.0),
        OverlayFrame::new("estudios-ribbon", "/frames/frame-03.png", -360.0, 2410.0)
            .with_size(520.0, 360.0)
            .with_scale(1.1, 1.1)
            .with_mobile_offset(0.0, 40.0),
        OverlayFrame::new("hobbies-vine", "/frames/frame-05.png", 300.0, 4620.0)
            .with_size(480.0, 420.0)
            .with_mobile_offset(-20.0, 60.0),
        OverlayFrame::new("pedida-rings", "/frames/frame-04.png", -320.0, 6880.0)
            .with_size(420.0, 420.0),
        OverlayFrame::new("final-wreath", "/frames/final-wreath.png", 0.0, 7980.0)
            .with_size(900.0, 520.0),
        OverlayFrame::new("legacy-corner", "/frames/frame-01.png", 640.0, 9800.0)
            .with_size(300.0, 300.0)
            .hidden(),
    ]
}

pub fn default_registry() -> FrameRegistry {
    FrameRegistry {
        frames: default_frames(),
    }
}
