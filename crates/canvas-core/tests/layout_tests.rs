// Host-side tests for the scale and hard-cut height computation.

use canvas_core::*;

const EPS: f64 = 1e-9;

fn design() -> DesignConfig {
    DesignConfig::default()
}

fn sample(sentinel_bottom: Option<f64>, scroll_mode: ScrollMode) -> LayoutSample {
    LayoutSample {
        natural_height: 8200.0,
        sentinel_bottom,
        scroll_mode,
    }
}

fn empty_registry() -> FrameRegistry {
    FrameRegistry::new(Vec::new()).unwrap()
}

#[test]
fn effective_design_width_matches_magnification() {
    let d = design();
    assert!((d.effective_design_width() - 1920.0 / 1.21).abs() < EPS);
    assert!((d.effective_design_width() - 1586.78).abs() < 0.01);
}

#[test]
fn scale_is_unity_when_viewport_equals_effective_width() {
    let d = design();
    let plan = compute_scale(d.effective_design_width(), &d).unwrap();
    assert!((plan.scale - 1.0).abs() < EPS);

    // the rounded figure lands within rounding error of 1
    let plan = compute_scale(1586.78, &d).unwrap();
    assert!((plan.scale - 1.0).abs() < 1e-5);
}

#[test]
fn scaled_canvas_width_always_equals_viewport() {
    let d = design();
    for w in [320.0, 375.0, 768.0, 793.39, 1024.0, 1440.0, 1920.0, 3840.0] {
        let plan = compute_scale(w, &d).unwrap();
        assert!(
            (plan.effective_design_width * plan.scale - w).abs() < 1e-6,
            "viewport {}",
            w
        );
    }
}

#[test]
fn invalid_viewports_are_rejected() {
    let d = design();
    for w in [0.0, -10.0, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            compute_scale(w, &d),
            Err(LayoutError::InvalidViewport(_))
        ));
    }
}

#[test]
fn invalid_design_is_rejected() {
    let d = DesignConfig {
        magnification: 0.0,
        ..design()
    };
    assert_eq!(compute_scale(1000.0, &d), Err(LayoutError::InvalidDesign));
}

#[test]
fn sentinel_bottom_defines_the_hard_cut() {
    let d = design();
    let p = sample(Some(8000.0), ScrollMode::Window);
    let h = derive_document_height(0.5, false, &p, &empty_registry(), &d);
    assert_eq!(h.source, HeightSource::Sentinel);
    assert_eq!(h.height, 4000.0);
    assert_eq!(h.buffer, 0.0);
}

#[test]
fn container_mode_adds_the_buffer() {
    let d = design();
    let p = sample(Some(8000.0), ScrollMode::Container);
    let h = derive_document_height(0.5, false, &p, &empty_registry(), &d);
    assert_eq!(h.height, 4000.0 + d.container_buffer_px);
}

#[test]
fn height_is_rounded_up_to_whole_pixels() {
    let d = design();
    let p = sample(Some(1001.0), ScrollMode::Window);
    let h = derive_document_height(0.5, false, &p, &empty_registry(), &d);
    assert_eq!(h.height, 501.0);
    let p = sample(Some(1001.2), ScrollMode::Window);
    let h = derive_document_height(0.5, false, &p, &empty_registry(), &d);
    assert_eq!(h.height, 501.0);
    let p = sample(Some(1003.0), ScrollMode::Window);
    let h = derive_document_height(0.5, false, &p, &empty_registry(), &d);
    assert_eq!(h.height, 502.0);
}

#[test]
fn lowest_frame_extends_the_hard_cut() {
    let d = design();
    let frames = FrameRegistry::new(vec![
        OverlayFrame::new("low", "/low.png", 0.0, 9000.0).with_size(400.0, 400.0),
    ])
    .unwrap();
    let p = sample(Some(8000.0), ScrollMode::Window);
    let h = derive_document_height(1.0, false, &p, &frames, &d);
    // centre 9000 + half height 200
    assert_eq!(h.overlay_bottom, 9200.0);
    assert_eq!(h.height, 9200.0);
    assert!(h.height >= h.content_bottom);
}

#[test]
fn height_never_cuts_content_or_visible_frames() {
    let d = design();
    let frames = default_registry();
    for w in [360.0, 768.0, 1280.0, 1920.0] {
        for sentinel in [None, Some(4000.0), Some(8300.0), Some(12000.0)] {
            let p = LayoutSample {
                natural_height: 8200.0,
                sentinel_bottom: sentinel,
                scroll_mode: ScrollMode::Container,
            };
            let plan = compute_layout(w, &d, &frames, &p).unwrap();
            let s = plan.scale.scale;
            let narrow = plan.narrow;
            assert!(plan.height.height >= plan.height.content_bottom);
            for frame in frames.visible() {
                assert!(
                    plan.height.height + 1e-6 >= frame.design_bottom(narrow) * s,
                    "{} cut at width {}",
                    frame.id,
                    w
                );
            }
        }
    }
}

#[test]
fn hidden_frames_do_not_affect_height() {
    let d = design();
    let p = sample(Some(1000.0), ScrollMode::Window);
    let frames = FrameRegistry::new(vec![
        OverlayFrame::new("ghost", "/ghost.png", 0.0, 50_000.0)
            .with_size(100.0, 100.0)
            .hidden(),
    ])
    .unwrap();
    let with_ghost = derive_document_height(1.0, false, &p, &frames, &d);
    let without = derive_document_height(1.0, false, &p, &empty_registry(), &d);
    assert_eq!(with_ghost.overlay_bottom, 0.0);
    assert_eq!(with_ghost.height, without.height);
}

#[test]
fn missing_sentinel_uses_fallback_with_minimum() {
    let d = design();
    let p = LayoutSample {
        natural_height: 1000.0,
        sentinel_bottom: None,
        scroll_mode: ScrollMode::Window,
    };
    let plan = compute_layout(400.0, &d, &empty_registry(), &p).unwrap();
    assert_eq!(plan.height.source, HeightSource::Fallback);
    assert!(plan.height.height >= d.fallback_min_height_px);
}

#[test]
fn unrendered_sentinel_takes_the_fallback_path() {
    let d = design();
    for bottom in [0.0, -350.0, f64::NAN] {
        let p = LayoutSample {
            natural_height: 1000.0,
            sentinel_bottom: Some(bottom),
            scroll_mode: ScrollMode::Container,
        };
        let plan = compute_layout(400.0, &d, &empty_registry(), &p).unwrap();
        assert_eq!(plan.height.source, HeightSource::Fallback);
        assert!(plan.height.height >= d.fallback_min_height_px);
    }
}

#[test]
fn mirrored_frame_is_never_cut() {
    let d = design();
    let frames = FrameRegistry::new(vec![OverlayFrame::new("m", "/m.png", 0.0, 1000.0)
        .with_size(400.0, 400.0)
        .with_scale(1.0, -1.0)])
    .unwrap();
    let p = sample(Some(500.0), ScrollMode::Window);
    let h = derive_document_height(1.0, false, &p, &frames, &d);
    assert_eq!(h.height, 1200.0);
}

#[test]
fn fallback_uses_scaled_natural_height_when_larger() {
    let d = design();
    let p = LayoutSample {
        natural_height: 10_000.0,
        sentinel_bottom: None,
        scroll_mode: ScrollMode::Window,
    };
    let plan = compute_layout(d.effective_design_width(), &d, &empty_registry(), &p).unwrap();
    assert_eq!(plan.height.height, 10_000.0);
}

#[test]
fn non_finite_natural_height_is_an_error() {
    let d = design();
    let p = LayoutSample {
        natural_height: f64::NAN,
        sentinel_bottom: Some(100.0),
        scroll_mode: ScrollMode::Window,
    };
    assert!(matches!(
        compute_layout(800.0, &d, &empty_registry(), &p),
        Err(LayoutError::InvalidMeasurement(_))
    ));
}

#[test]
fn narrow_threshold_is_inclusive() {
    let d = design();
    let p = sample(Some(1000.0), ScrollMode::Window);
    let frames = empty_registry();
    assert!(compute_layout(768.0, &d, &frames, &p).unwrap().narrow);
    assert!(!compute_layout(768.5, &d, &frames, &p).unwrap().narrow);
}

#[test]
fn compute_layout_is_idempotent() {
    let d = design();
    let frames = default_registry();
    let p = sample(Some(8100.0), ScrollMode::Container);
    let a = compute_layout(1024.0, &d, &frames, &p).unwrap();
    let b = compute_layout(1024.0, &d, &frames, &p).unwrap();
    assert_eq!(a, b);
}

#[test]
fn layout_state_carries_plan_values() {
    let d = design();
    let p = sample(Some(2000.0), ScrollMode::Window);
    let plan = compute_layout(793.39, &d, &empty_registry(), &p).unwrap();
    let canvas = CanvasBox::new(0.0, 0.0, 793.39, 1000.0);
    let state = plan.into_state(canvas);
    assert_eq!(state.scale, plan.scale.scale);
    assert_eq!(state.document_height, plan.height.height);
    assert_eq!(state.canvas_box, canvas);
    assert_eq!(state.height_source, HeightSource::Sentinel);

    let json = serde_json::to_value(state).unwrap();
    assert!(json.get("documentHeight").is_some());
    assert!(json.get("effectiveDesignWidth").is_some());
    assert_eq!(json["heightSource"], "sentinel");
}

#[test]
fn ready_latch_fires_once() {
    let mut latch = ReadyLatch::default();
    assert!(!latch.has_fired());
    assert!(latch.fire());
    assert!(latch.has_fired());
    assert!(!latch.fire());
    assert!(!latch.fire());
}

#[test]
fn canvas_box_helpers() {
    let b = CanvasBox::new(10.0, 20.0, 100.0, 50.0);
    assert_eq!(b.center_x(), 60.0);
    assert_eq!(b.bottom(), 70.0);
}
