// Inline-style values written by the layout engine and the overlay layers.
// Pure string building so the exact output can be checked on the host.

use canvas_core::{AnchorPlacement, FramePlacement, LayoutPlan};
use glam::DVec2;

pub type StyleList = Vec<(&'static str, String)>;

#[inline]
fn round3(v: f64) -> f64 {
    let r = (v * 1000.0).round() / 1000.0;
    // avoid "-0px"
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

#[inline]
pub fn px(v: f64) -> String {
    format!("{}px", round3(v))
}

#[inline]
pub fn num(v: f64) -> String {
    format!("{}", round6(v))
}

// scale factors keep more precision than pixel lengths
#[inline]
fn round6(v: f64) -> f64 {
    let r = (v * 1_000_000.0).round() / 1_000_000.0;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

pub fn scale_transform(scale: f64) -> String {
    format!("scale({})", num(scale))
}

pub fn frame_transform(css_scale: DVec2) -> String {
    format!(
        "translate(-50%, -50%) scale({}, {})",
        num(css_scale.x),
        num(css_scale.y)
    )
}

pub fn anchor_transform(translate: DVec2, scale: DVec2) -> String {
    format!(
        "translate({}, {}) scale({}, {})",
        px(translate.x),
        px(translate.y),
        num(scale.x),
        num(scale.y)
    )
}

/// Styles for the canvas root. Width first: the natural height is measured
/// after the width is in place.
pub fn canvas_width_style(effective_design_width: f64) -> StyleList {
    vec![("width", px(effective_design_width))]
}

pub fn canvas_transform_styles(plan: &LayoutPlan, transform_hints: bool) -> StyleList {
    let mut styles = vec![
        ("transform-origin", "top left".to_string()),
        ("transform", scale_transform(plan.scale.scale)),
    ];
    if transform_hints {
        styles.push(("will-change", "transform".to_string()));
        styles.push(("backface-visibility", "hidden".to_string()));
    }
    styles
}

/// Hard cut: min = max = exact height, everything below is clipped.
pub fn wrapper_styles(height: f64) -> StyleList {
    let h = px(height);
    vec![
        ("height", h.clone()),
        ("min-height", h.clone()),
        ("max-height", h),
        ("overflow", "hidden".to_string()),
    ]
}

/// Scaled content never scrolls sideways. Vertical overflow belongs to the
/// page shell, which may lock it while a dialog is open.
pub fn horizontal_clip_styles() -> StyleList {
    vec![("overflow-x", "hidden".to_string())]
}

/// Absolute layer spanning its host; frames never take pointer events.
pub fn frames_layer_styles(z_index: i32) -> StyleList {
    vec![
        ("position", "absolute".to_string()),
        ("top", "0px".to_string()),
        ("left", "0px".to_string()),
        ("width", "100%".to_string()),
        ("height", "100%".to_string()),
        ("pointer-events", "none".to_string()),
        ("z-index", z_index.to_string()),
    ]
}

/// An absolute child resolves against the nearest positioned ancestor, so a
/// static host has to become `relative` before the layer goes in.
pub fn needs_containing_block(computed_position: &str) -> bool {
    matches!(computed_position.trim(), "" | "static")
}

pub fn frame_styles(placement: &FramePlacement) -> StyleList {
    let mut styles = vec![
        ("position", "absolute".to_string()),
        ("left", px(placement.center.x)),
        ("top", px(placement.center.y)),
        ("transform", frame_transform(placement.css_scale)),
        ("pointer-events", "none".to_string()),
    ];
    match placement.width {
        Some(w) => styles.push(("width", px(w))),
        None => styles.push(("width", "auto".to_string())),
    }
    match placement.height {
        Some(h) => styles.push(("height", px(h))),
        None => styles.push(("height", "auto".to_string())),
    }
    styles
}

pub fn anchor_frame_styles(placement: &AnchorPlacement) -> StyleList {
    vec![
        ("left", px(placement.left)),
        ("top", px(placement.top)),
        ("width", px(placement.width)),
        ("height", px(placement.height)),
        ("transform", anchor_transform(placement.translate, placement.scale)),
    ]
}
