//! Overlay frame placement.
//!
//! Frames and canvas are scaled by the same factor, so a frame authored at a
//! design coordinate stays on that coordinate at every viewport width.

use crate::frames::{FrameRegistry, OverlayFrame};
use crate::layout::CanvasBox;
use glam::DVec2;

/// Rendered geometry of one frame, relative to the overlay layer.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePlacement {
    pub id: String,
    pub src: String,
    /// Centre of the frame.
    pub center: DVec2,
    /// Box size for the dimensions the frame specifies.
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Scale applied by CSS on top of the box size.
    pub css_scale: DVec2,
    /// Total scale relative to design pixels: `(scale_x * s, scale_y * s)`.
    pub effective_scale: DVec2,
}

/// Placement origin: the canvas's horizontal centre and its top edge,
/// expressed relative to `layer` (the unscaled overlay layer).
#[inline]
pub fn frame_origin(canvas: &CanvasBox, layer: &CanvasBox) -> DVec2 {
    DVec2::new(canvas.center_x() - layer.left, canvas.top - layer.top)
}

pub fn place_frame(frame: &OverlayFrame, origin: DVec2, scale: f64, narrow: bool) -> FramePlacement {
    let offset = frame.effective_offset(narrow);
    let sized = frame.width.is_some() || frame.height.is_some();
    let frame_scale = DVec2::new(frame.scale_x, frame.scale_y);
    FramePlacement {
        id: frame.id.clone(),
        src: frame.src.clone(),
        center: origin + offset * scale,
        width: frame.width.map(|w| w * scale),
        height: frame.height.map(|h| h * scale),
        // an unsized image keeps its intrinsic size, so the canvas scale
        // has to come from the transform instead
        css_scale: if sized { frame_scale } else { frame_scale * scale },
        effective_scale: frame_scale * scale,
    }
}

/// Placements for every visible frame, in registry order.
pub fn place_frames(
    registry: &FrameRegistry,
    origin: DVec2,
    scale: f64,
    narrow: bool,
) -> Vec<FramePlacement> {
    registry
        .visible()
        .map(|f| place_frame(f, origin, scale, narrow))
        .collect()
}
