// Host-side tests for overlay frame placement.

use canvas_core::*;
use glam::DVec2;

const TOL: f64 = 0.01;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < TOL
}

#[test]
fn half_scale_frame_lands_on_its_design_coordinate() {
    let d = DesignConfig::default();
    let plan = compute_scale(793.39, &d).unwrap();
    assert!((plan.scale - 0.5).abs() < 1e-3);

    let frame = OverlayFrame::new("escapadas", "/f.png", 338.0, 1284.0).with_size(600.0, 400.0);
    let p = place_frame(&frame, DVec2::ZERO, plan.scale, d.is_narrow(793.39));
    assert!(close(p.width.unwrap(), 300.0));
    assert!(close(p.height.unwrap(), 200.0));
    assert!(close(p.center.x, 169.0));
    assert!(close(p.center.y, 642.0));
    // explicit size carries the canvas scale, CSS keeps the frame's own
    assert_eq!(p.css_scale, DVec2::ONE);
    assert!(close(p.effective_scale.x, 0.5));
}

#[test]
fn placement_is_relative_to_origin() {
    let frame = OverlayFrame::new("a", "/a.png", 100.0, 200.0).with_size(10.0, 10.0);
    let origin = DVec2::new(400.0, 30.0);
    let p = place_frame(&frame, origin, 2.0, false);
    assert_eq!(p.center, DVec2::new(600.0, 430.0));
    assert_eq!(p.width, Some(20.0));
}

#[test]
fn unsized_frame_scales_through_css() {
    let frame = OverlayFrame::new("a", "/a.png", 0.0, 0.0).with_scale(2.0, 3.0);
    let p = place_frame(&frame, DVec2::ZERO, 0.5, false);
    assert_eq!(p.width, None);
    assert_eq!(p.height, None);
    assert_eq!(p.css_scale, DVec2::new(1.0, 1.5));
    assert_eq!(p.effective_scale, DVec2::new(1.0, 1.5));
}

#[test]
fn frame_scale_is_preserved_for_sized_frames() {
    let frame = OverlayFrame::new("a", "/a.png", 0.0, 0.0)
        .with_size(100.0, 50.0)
        .with_scale(1.1, 1.1);
    let p = place_frame(&frame, DVec2::ZERO, 0.5, false);
    assert_eq!(p.width, Some(50.0));
    assert_eq!(p.css_scale, DVec2::new(1.1, 1.1));
    assert!((p.effective_scale.x - 0.55).abs() < 1e-12);
}

#[test]
fn mobile_offset_only_applies_when_narrow() {
    let frame = OverlayFrame::new("a", "/a.png", 10.0, 100.0).with_mobile_offset(-5.0, 40.0);
    assert_eq!(frame.effective_offset(false), DVec2::new(10.0, 100.0));
    assert_eq!(frame.effective_offset(true), DVec2::new(5.0, 140.0));

    let wide = place_frame(&frame, DVec2::ZERO, 1.0, false);
    let narrow = place_frame(&frame, DVec2::ZERO, 1.0, true);
    assert_eq!(wide.center.y, 100.0);
    assert_eq!(narrow.center.y, 140.0);
}

#[test]
fn hidden_frames_are_never_placed() {
    let registry = FrameRegistry::new(vec![
        OverlayFrame::new("shown", "/a.png", 0.0, 0.0),
        OverlayFrame::new("ghost", "/b.png", 0.0, 0.0).hidden(),
    ])
    .unwrap();
    let placements = place_frames(&registry, DVec2::ZERO, 1.0, false);
    assert_eq!(placements.len(), 1);
    assert_eq!(placements[0].id, "shown");
}

#[test]
fn placements_follow_registry_order() {
    let registry = default_registry();
    let ids: Vec<_> = place_frames(&registry, DVec2::ZERO, 1.0, false)
        .into_iter()
        .map(|p| p.id)
        .collect();
    let expected: Vec<_> = registry.visible().map(|f| f.id.clone()).collect();
    assert_eq!(ids, expected);
    assert!(!ids.iter().any(|id| id == "legacy-corner"));
}

#[test]
fn origin_is_canvas_center_top_relative_to_layer() {
    let canvas = CanvasBox::new(20.0, 100.0, 800.0, 4000.0);
    let layer = CanvasBox::new(20.0, 60.0, 800.0, 4000.0);
    assert_eq!(frame_origin(&canvas, &layer), DVec2::new(400.0, 40.0));
}

#[test]
fn frames_stay_anchored_across_viewports() {
    // design coordinate / placed coordinate ratio must equal the scale
    let d = DesignConfig::default();
    let frame = OverlayFrame::new("a", "/a.png", -360.0, 2410.0).with_size(520.0, 360.0);
    for w in [800.0, 1024.0, 1586.78, 2560.0] {
        let s = compute_scale(w, &d).unwrap().scale;
        let p = place_frame(&frame, DVec2::ZERO, s, false);
        assert!((p.center.x / s - frame.x).abs() < 1e-9);
        assert!((p.center.y / s - frame.y).abs() < 1e-9);
        assert!((p.width.unwrap() / s - 520.0).abs() < 1e-9);
    }
}
