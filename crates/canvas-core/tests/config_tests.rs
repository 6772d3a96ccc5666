// Host-side tests for the frame registry and the JSON site config.

use canvas_core::*;

fn frame<'a>(registry: &'a FrameRegistry, id: &str) -> &'a OverlayFrame {
    registry.frames().iter().find(|f| f.id == id).unwrap()
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = FrameRegistry::new(vec![
        OverlayFrame::new("a", "/a.png", 0.0, 0.0),
        OverlayFrame::new("a", "/b.png", 1.0, 1.0),
    ])
    .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateId(id) if id == "a"));
}

#[test]
fn empty_id_is_rejected() {
    let err = FrameRegistry::new(vec![OverlayFrame::new("", "/a.png", 0.0, 0.0)]).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyId));
}

#[test]
fn non_finite_and_negative_numbers_are_rejected() {
    let err = FrameRegistry::new(vec![OverlayFrame::new("a", "/a.png", f64::NAN, 0.0)])
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidNumber { field: "x", .. }));

    let err = FrameRegistry::new(vec![
        OverlayFrame::new("a", "/a.png", 0.0, 0.0).with_size(-1.0, 10.0)
    ])
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidNumber { field: "width", .. }));
}

#[test]
fn default_registry_is_valid() {
    let frames = default_frames();
    let registry = FrameRegistry::new(frames.clone()).unwrap();
    assert_eq!(registry.len(), frames.len());
    assert!(!frame(&registry, "legacy-corner").visible);
    assert!(registry.visible().count() < registry.len());
}

#[test]
fn lowest_visible_bottom_ignores_hidden_frames() {
    let registry = FrameRegistry::new(vec![
        OverlayFrame::new("a", "/a.png", 0.0, 100.0).with_size(10.0, 20.0),
        OverlayFrame::new("b", "/b.png", 0.0, 900.0).hidden(),
    ])
    .unwrap();
    assert_eq!(registry.lowest_visible_bottom(false), Some(110.0));

    let none = FrameRegistry::new(vec![OverlayFrame::new("b", "/b.png", 0.0, 900.0).hidden()])
        .unwrap();
    assert_eq!(none.lowest_visible_bottom(false), None);
}

#[test]
fn unsized_frame_contributes_its_centre_line() {
    let frame = OverlayFrame::new("a", "/a.png", 0.0, 300.0);
    assert_eq!(frame.design_bottom(false), 300.0);
    let scaled = OverlayFrame::new("a", "/a.png", 0.0, 300.0)
        .with_size(100.0, 100.0)
        .with_scale(1.0, 2.0);
    assert_eq!(scaled.design_bottom(false), 400.0);
}

#[test]
fn mirrored_frame_keeps_its_full_extent() {
    let upright = OverlayFrame::new("a", "/a.png", 0.0, 1000.0).with_size(400.0, 400.0);
    let mirrored = upright.clone().with_scale(1.0, -1.0);
    assert_eq!(mirrored.design_bottom(false), upright.design_bottom(false));
    assert_eq!(mirrored.design_bottom(false), 1200.0);
}

#[test]
fn design_defaults_validate() {
    let d = DesignConfig::default();
    assert_eq!(d.design_width, DEFAULT_DESIGN_WIDTH);
    assert_eq!(d.magnification, DEFAULT_MAGNIFICATION);
    assert!(d.validate().is_ok());

    let bad = DesignConfig {
        magnification: -1.0,
        ..DesignConfig::default()
    };
    assert!(matches!(
        bad.validate(),
        Err(ConfigError::InvalidDesign("magnification"))
    ));
}

#[test]
fn json_overrides_design_and_frames() {
    let json = r#"{
        "design": { "designWidth": 1440, "magnification": 1.0 },
        "frames": [
            { "id": "only", "src": "/only.png", "x": 12, "y": 34, "width": 100, "height": 50,
              "mobileOffsetY": 8 },
            { "id": "off", "src": "/off.png", "visible": false }
        ]
    }"#;
    let config = SiteConfig::from_json(json).unwrap();
    assert_eq!(config.design.design_width, 1440.0);
    assert_eq!(config.design.magnification, 1.0);
    // omitted design fields keep their defaults
    assert_eq!(config.design.container_buffer_px, DEFAULT_CONTAINER_BUFFER_PX);
    assert_eq!(config.frames.len(), 2);

    let only = frame(&config.frames, "only");
    assert_eq!(only.width, Some(100.0));
    assert_eq!(only.scale_x, 1.0);
    assert_eq!(only.mobile_offset_y, Some(8.0));
    assert!(only.visible);
    assert!(!frame(&config.frames, "off").visible);

    // anchors were not overridden
    assert_eq!(config.anchors, default_anchor_frames());
}

#[test]
fn empty_json_object_yields_defaults() {
    let config = SiteConfig::from_json("{}").unwrap();
    assert_eq!(config.design, DesignConfig::default());
    assert_eq!(config.frames.len(), default_frames().len());
}

#[test]
fn invalid_json_falls_back_to_defaults() {
    assert!(matches!(
        SiteConfig::from_json("{ not json"),
        Err(ConfigError::Json(_))
    ));
    let config = SiteConfig::from_json_or_default(Some("{ not json"));
    assert_eq!(config.design, DesignConfig::default());

    let dup = r#"{ "frames": [ { "id": "a", "src": "/a" }, { "id": "a", "src": "/b" } ] }"#;
    assert!(SiteConfig::from_json(dup).is_err());
    let config = SiteConfig::from_json_or_default(Some(dup));
    assert_eq!(config.frames.len(), default_frames().len());
}

#[test]
fn missing_or_blank_json_uses_defaults() {
    for input in [None, Some(""), Some("   \n")] {
        let config = SiteConfig::from_json_or_default(input);
        assert_eq!(config.design, DesignConfig::default());
    }
}
