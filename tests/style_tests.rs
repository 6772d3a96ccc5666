// Host-side tests for the inline styles written to the DOM.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod style {
    include!("../src/style.rs");
}

use canvas_core::*;
use glam::DVec2;
use style::*;

fn lookup<'a>(styles: &'a StyleList, property: &str) -> Option<&'a str> {
    styles
        .iter()
        .find(|(p, _)| *p == property)
        .map(|(_, v)| v.as_str())
}

fn plan_at(viewport: f64) -> LayoutPlan {
    let sample = LayoutSample {
        natural_height: 8000.0,
        sentinel_bottom: Some(8000.0),
        scroll_mode: ScrollMode::Container,
    };
    compute_layout(viewport, &DesignConfig::default(), &default_registry(), &sample).unwrap()
}

#[test]
fn px_rounds_and_never_prints_negative_zero() {
    assert_eq!(px(12.0), "12px");
    assert_eq!(px(1.23456), "1.235px");
    assert_eq!(px(-0.0001), "0px");
    assert_eq!(num(0.5), "0.5");
    assert_eq!(num(-0.0000001), "0");
}

#[test]
fn canvas_transform_is_top_left_anchored() {
    let plan = plan_at(DesignConfig::default().effective_design_width());
    let styles = canvas_transform_styles(&plan, false);
    assert_eq!(lookup(&styles, "transform-origin"), Some("top left"));
    assert_eq!(lookup(&styles, "transform"), Some("scale(1)"));
    assert_eq!(lookup(&styles, "will-change"), None);
}

#[test]
fn transform_hints_are_opt_in() {
    let plan = plan_at(1024.0);
    let styles = canvas_transform_styles(&plan, true);
    assert_eq!(lookup(&styles, "will-change"), Some("transform"));
    assert_eq!(lookup(&styles, "backface-visibility"), Some("hidden"));
}

#[test]
fn canvas_width_is_the_effective_design_width() {
    let styles = canvas_width_style(DesignConfig::default().effective_design_width());
    assert_eq!(lookup(&styles, "width"), Some("1586.777px"));
}

#[test]
fn wrapper_height_is_a_hard_cut() {
    let styles = wrapper_styles(4024.0);
    assert_eq!(lookup(&styles, "height"), Some("4024px"));
    assert_eq!(lookup(&styles, "min-height"), Some("4024px"));
    assert_eq!(lookup(&styles, "max-height"), Some("4024px"));
    assert_eq!(lookup(&styles, "overflow"), Some("hidden"));
}

#[test]
fn sized_frame_styles() {
    let frame = OverlayFrame::new("a", "/a.png", 338.0, 1284.0).with_size(600.0, 400.0);
    let placement = place_frame(&frame, DVec2::new(400.0, 0.0), 0.5, false);
    let styles = frame_styles(&placement);
    assert_eq!(lookup(&styles, "position"), Some("absolute"));
    assert_eq!(lookup(&styles, "left"), Some("569px"));
    assert_eq!(lookup(&styles, "top"), Some("642px"));
    assert_eq!(lookup(&styles, "width"), Some("300px"));
    assert_eq!(lookup(&styles, "height"), Some("200px"));
    assert_eq!(
        lookup(&styles, "transform"),
        Some("translate(-50%, -50%) scale(1, 1)")
    );
    assert_eq!(lookup(&styles, "pointer-events"), Some("none"));
}

#[test]
fn unsized_frame_styles_use_auto_box() {
    let frame = OverlayFrame::new("a", "/a.png", 0.0, 100.0);
    let placement = place_frame(&frame, DVec2::ZERO, 0.5, false);
    let styles = frame_styles(&placement);
    assert_eq!(lookup(&styles, "width"), Some("auto"));
    assert_eq!(lookup(&styles, "height"), Some("auto"));
    assert_eq!(
        lookup(&styles, "transform"),
        Some("translate(-50%, -50%) scale(0.5, 0.5)")
    );
}

#[test]
fn anchor_frame_styles_follow_the_rect() {
    let rect = AnchorRect {
        left: 10.0,
        top: 20.5,
        width: 300.0,
        height: 200.0,
    };
    let placement = place_anchor_frame(&rect, &AnchorFrameConfig::new("a", "/a.png")).unwrap();
    let styles = anchor_frame_styles(&placement);
    assert_eq!(lookup(&styles, "left"), Some("10px"));
    assert_eq!(lookup(&styles, "top"), Some("20.5px"));
    assert_eq!(lookup(&styles, "height"), Some("202px"));
    assert_eq!(
        lookup(&styles, "transform"),
        Some("translate(-2px, 0px) scale(1.5, 1.5)")
    );
}

#[test]
fn static_hosts_need_a_containing_block() {
    assert!(needs_containing_block("static"));
    assert!(needs_containing_block(""));
    assert!(needs_containing_block(" static "));
    for positioned in ["relative", "absolute", "fixed", "sticky"] {
        assert!(!needs_containing_block(positioned), "{}", positioned);
    }
}

#[test]
fn frames_layer_covers_its_host_without_taking_clicks() {
    let styles = frames_layer_styles(50);
    assert_eq!(lookup(&styles, "position"), Some("absolute"));
    assert_eq!(lookup(&styles, "width"), Some("100%"));
    assert_eq!(lookup(&styles, "pointer-events"), Some("none"));
    assert_eq!(lookup(&styles, "z-index"), Some("50"));
}

#[test]
fn horizontal_clip_leaves_vertical_scrolling_alone() {
    let styles = horizontal_clip_styles();
    assert_eq!(lookup(&styles, "overflow-x"), Some("hidden"));
    assert_eq!(lookup(&styles, "overflow-y"), None);
    assert_eq!(lookup(&styles, "overflow"), None);
}
