#![cfg(target_arch = "wasm32")]
use canvas_core::{
    tier_from_query, AnchorFrames, LayoutState, PlatformInfo, SiteConfig, Tier, TierDetector,
    TierParams, UserAgentDetector, TIER_QUERY_PARAM,
};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys as web;

mod anchors;
mod constants;
mod diagnostics;
mod dom;
mod overlay;
mod style;
mod zoom;

use constants::CONFIG_SCRIPT_ID;

struct App {
    zoom: zoom::ZoomController,
    overlay: overlay::OverlayRenderer,
    anchors: anchors::AnchorBridge,
    diagnostics: Rc<diagnostics::Diagnostics>,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

fn platform_info(window: &web::Window) -> PlatformInfo {
    let navigator = window.navigator();
    PlatformInfo {
        user_agent: navigator.user_agent().unwrap_or_default(),
        max_touch_points: navigator.max_touch_points().max(0) as u32,
    }
}

/// Tier chosen once at start-up; `?tier=` overrides the detector.
fn select_tier(window: &web::Window, detector: &dyn TierDetector) -> Tier {
    let forced = window
        .location()
        .search()
        .ok()
        .and_then(|search| tier_from_query(&search));
    match forced {
        Some(tier) => {
            log::info!("[app] tier forced via ?{}=: {}", TIER_QUERY_PARAM, tier.as_str());
            tier
        }
        None => detector.detect(&platform_info(window)),
    }
}

fn load_config(document: &web::Document) -> SiteConfig {
    let json = document
        .get_element_by_id(CONFIG_SCRIPT_ID)
        .and_then(|el| el.text_content());
    SiteConfig::from_json_or_default(json.as_deref())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("canvas-web starting");

    if let Err(e) = init() {
        log::error!("init error: {:?}", e);
    }
    Ok(())
}

fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;

    let config = Rc::new(load_config(&document));
    let tier = select_tier(&window, &UserAgentDetector);
    let params = TierParams::for_tier(tier);
    log::info!(
        "[app] {} frames ({} visible), {} anchor configs, tier={}",
        config.frames.len(),
        config.frames.visible().count(),
        config.anchors.len(),
        tier.as_str()
    );

    let diagnostics = diagnostics::Diagnostics::new();
    diagnostics.install(&document, params.long_task_threshold_ms);

    let mut zoom = zoom::ZoomController::new(config.clone(), params.clone(), diagnostics.clone());
    let mut overlay = overlay::OverlayRenderer::new(
        config.clone(),
        zoom.layout_cell(),
        &params,
        diagnostics.clone(),
    );
    let mut anchors = anchors::AnchorBridge::new(
        AnchorFrames::new(config.anchors.iter().cloned()),
        diagnostics.clone(),
    );

    // renderers follow every layout pass with the engine's own state
    zoom.subscribe(overlay.layout_hook());
    zoom.subscribe(anchors.layout_hook());

    zoom.start()?;
    overlay.start(params.observer_enabled)?;
    anchors.start()?;

    APP.with(|app| {
        *app.borrow_mut() = Some(App {
            zoom,
            overlay,
            anchors,
            diagnostics,
        });
    });
    Ok(())
}

fn layout_to_js(state: LayoutState) -> JsValue {
    serde_json::to_string(&state)
        .ok()
        .and_then(|json| js_sys::JSON::parse(&json).ok())
        .unwrap_or(JsValue::UNDEFINED)
}

/// Detach every listener, cancel every timer and disconnect every observer.
#[wasm_bindgen]
pub fn teardown() {
    APP.with(|app| {
        if let Some(mut app) = app.borrow_mut().take() {
            app.anchors.teardown();
            app.overlay.teardown();
            app.zoom.teardown();
            app.diagnostics.teardown();
        }
    });
}

/// Latest layout as a plain object, or `undefined` before the first pass.
#[wasm_bindgen]
pub fn current_layout() -> JsValue {
    APP.with(|app| {
        app.borrow()
            .as_ref()
            .and_then(|app| app.zoom.current())
            .map(layout_to_js)
            .unwrap_or(JsValue::UNDEFINED)
    })
}

/// Run one layout pass now, for content injected after start-up.
#[wasm_bindgen]
pub fn relayout() -> JsValue {
    APP.with(|app| {
        app.borrow()
            .as_ref()
            .and_then(|app| app.zoom.run_now("manual"))
            .map(layout_to_js)
            .unwrap_or(JsValue::UNDEFINED)
    })
}

#[wasm_bindgen]
pub fn export_diagnostics() -> String {
    APP.with(|app| {
        app.borrow()
            .as_ref()
            .map(|app| app.diagnostics.export_json())
            .unwrap_or_else(|| "{}".to_string())
    })
}

#[wasm_bindgen]
pub fn clear_diagnostics() {
    APP.with(|app| {
        if let Some(app) = app.borrow().as_ref() {
            app.diagnostics.clear();
        }
    });
}
