//! Uniform-scale layout computation.
//!
//! The canvas is authored at `design_width` and laid out at
//! `design_width / magnification`; a single `scale(s)` transform maps that
//! width onto the viewport. Everything here is a pure function of explicit
//! inputs so it can be exercised without a DOM.

use crate::config::DesignConfig;
use crate::frames::FrameRegistry;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("viewport width {0} is not a positive finite number")]
    InvalidViewport(f64),
    #[error("design width / magnification must be positive and finite")]
    InvalidDesign,
    #[error("natural canvas height {0} is not a finite number")]
    InvalidMeasurement(f64),
}

/// How the page scrolls, which decides the safety buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScrollMode {
    /// The document itself scrolls; no rounding slack is needed.
    Window,
    /// An internal scroll container clips the canvas.
    Container,
}

/// Result of the scale step alone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalePlan {
    pub viewport_width: f64,
    pub effective_design_width: f64,
    pub scale: f64,
}

pub fn compute_scale(viewport_width: f64, design: &DesignConfig) -> Result<ScalePlan, LayoutError> {
    if !viewport_width.is_finite() || viewport_width <= 0.0 {
        return Err(LayoutError::InvalidViewport(viewport_width));
    }
    let effective = design.effective_design_width();
    if !effective.is_finite() || effective <= 0.0 || !design.magnification.is_finite() {
        return Err(LayoutError::InvalidDesign);
    }
    Ok(ScalePlan {
        viewport_width,
        effective_design_width: effective,
        scale: viewport_width / effective,
    })
}

/// Live bounding box in viewport coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CanvasBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// DOM measurements taken before the transform and height are written.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutSample {
    /// Flow height of the canvas root, unaffected by the transform.
    pub natural_height: f64,
    /// Bottom of the final-section sentinel in design pixels, measured from
    /// the canvas top via offset chains. `None` when the sentinel is missing
    /// or not rendered; a non-positive value is treated the same way.
    pub sentinel_bottom: Option<f64>,
    pub scroll_mode: ScrollMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HeightSource {
    Sentinel,
    Fallback,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightDerivation {
    /// Final pixel height for the scroll container.
    pub height: f64,
    pub source: HeightSource,
    /// Scaled content bottom (sentinel or fallback), before rounding.
    pub content_bottom: f64,
    /// Scaled bottom of the lowest visible frame, 0 when none is visible.
    pub overlay_bottom: f64,
    pub buffer: f64,
}

/// Derive the "hard cut" height: nothing below it is ever reachable.
pub fn derive_document_height(
    scale: f64,
    narrow: bool,
    sample: &LayoutSample,
    frames: &FrameRegistry,
    design: &DesignConfig,
) -> HeightDerivation {
    let (content_bottom, source) = match sample.sentinel_bottom {
        Some(bottom) if bottom.is_finite() && bottom > 0.0 => {
            (bottom * scale, HeightSource::Sentinel)
        }
        // an unrendered sentinel reads as zero or negative
        _ => (
            (sample.natural_height * scale).max(design.fallback_min_height_px),
            HeightSource::Fallback,
        ),
    };
    let overlay_bottom = frames
        .lowest_visible_bottom(narrow)
        .map(|b| (b * scale).max(0.0))
        .unwrap_or(0.0);
    let buffer = match sample.scroll_mode {
        ScrollMode::Window => 0.0,
        ScrollMode::Container => design.container_buffer_px,
    };
    HeightDerivation {
        height: content_bottom.max(overlay_bottom).max(0.0).ceil() + buffer,
        source,
        content_bottom,
        overlay_bottom,
        buffer,
    }
}

/// Everything a layout pass decides before touching the DOM.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutPlan {
    pub scale: ScalePlan,
    pub narrow: bool,
    pub natural_height: f64,
    pub height: HeightDerivation,
}

pub fn compute_layout(
    viewport_width: f64,
    design: &DesignConfig,
    frames: &FrameRegistry,
    sample: &LayoutSample,
) -> Result<LayoutPlan, LayoutError> {
    let scale = compute_scale(viewport_width, design)?;
    if !sample.natural_height.is_finite() {
        return Err(LayoutError::InvalidMeasurement(sample.natural_height));
    }
    let narrow = design.is_narrow(viewport_width);
    let height = derive_document_height(scale.scale, narrow, sample, frames, design);
    Ok(LayoutPlan {
        scale,
        narrow,
        natural_height: sample.natural_height,
        height,
    })
}

impl LayoutPlan {
    pub fn into_state(self, canvas_box: CanvasBox) -> LayoutState {
        LayoutState {
            scale: self.scale.scale,
            effective_design_width: self.scale.effective_design_width,
            viewport_width: self.scale.viewport_width,
            narrow: self.narrow,
            canvas_box,
            document_height: self.height.height,
            height_source: self.height.source,
        }
    }
}

/// Derived per pass and handed to the overlay renderer; never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutState {
    pub scale: f64,
    pub effective_design_width: f64,
    pub viewport_width: f64,
    pub narrow: bool,
    pub canvas_box: CanvasBox,
    pub document_height: f64,
    pub height_source: HeightSource,
}

/// One-shot flag behind the readiness signal.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReadyLatch {
    fired: bool,
}

impl ReadyLatch {
    /// Returns `true` exactly once, on the first call.
    pub fn fire(&mut self) -> bool {
        !std::mem::replace(&mut self.fired, true)
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
