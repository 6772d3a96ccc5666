use crate::constants::{
    CANVAS_ROOT_ID, CANVAS_WRAPPER_ID, FRAMES_LAYER_ID, FRAMES_LAYER_Z_INDEX, OVERLAY_IMAGE_PREFIX,
};
use crate::diagnostics::Diagnostics;
use crate::dom;
use crate::style;
use crate::zoom::LayoutCell;
use anyhow::anyhow;
use canvas_core::{frame_origin, parse_transform_scale, place_frames, SiteConfig, TierParams};
use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

struct Inner {
    config: Rc<SiteConfig>,
    layout: LayoutCell,
    diagnostics: Rc<Diagnostics>,
    debounce_ms: u32,
    debounce: RefCell<Option<Timeout>>,
}

struct SizeWatch {
    observer: web::ResizeObserver,
    _callback: Closure<dyn FnMut()>,
}

impl Drop for SizeWatch {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// Draws the registry frames over the scaled canvas.
pub struct OverlayRenderer {
    inner: Rc<Inner>,
    listeners: Vec<EventListener>,
    size_watch: Option<SizeWatch>,
}

fn ensure_layer(document: &web::Document) -> anyhow::Result<web::HtmlElement> {
    if let Some(layer) = dom::html_element_by_id(document, FRAMES_LAYER_ID) {
        return Ok(layer);
    }
    let host = dom::html_element_by_id(document, CANVAS_WRAPPER_ID)
        .or_else(|| document.body())
        .ok_or_else(|| anyhow!("no host for #{}", FRAMES_LAYER_ID))?;
    let layer: web::HtmlElement = document
        .create_element("div")
        .map_err(dom::js_err)?
        .dyn_into()
        .map_err(|_| anyhow!("div is not an HtmlElement"))?;
    layer.set_id(FRAMES_LAYER_ID);
    dom::apply_styles(&layer, &style::frames_layer_styles(FRAMES_LAYER_Z_INDEX))?;
    let position = dom::computed_style(&host, "position").unwrap_or_default();
    if style::needs_containing_block(&position) {
        log::debug!("[overlay] host was static, making it relative");
        dom::set_style(&host, "position", "relative")?;
    }
    host.append_child(&layer).map_err(dom::js_err)?;
    Ok(layer)
}

fn ensure_image(
    document: &web::Document,
    layer: &web::HtmlElement,
    id: &str,
    src: &str,
) -> anyhow::Result<web::HtmlImageElement> {
    let dom_id = format!("{}{}", OVERLAY_IMAGE_PREFIX, id);
    let img = match document.get_element_by_id(&dom_id) {
        Some(el) => el
            .dyn_into::<web::HtmlImageElement>()
            .map_err(|_| anyhow!("#{} is not an <img>", dom_id))?,
        None => {
            let img: web::HtmlImageElement = document
                .create_element("img")
                .map_err(dom::js_err)?
                .dyn_into()
                .map_err(|_| anyhow!("img is not an HtmlImageElement"))?;
            img.set_id(&dom_id);
            img.set_alt("");
            _ = img.set_attribute("aria-hidden", "true");
            layer.append_child(&img).map_err(dom::js_err)?;
            img
        }
    };
    if img.get_attribute("src").as_deref() != Some(src) {
        img.set_src(src);
    }
    Ok(img)
}

impl Inner {
    fn render(&self) -> anyhow::Result<usize> {
        let document = dom::window_document().ok_or_else(|| anyhow!("no document"))?;
        let canvas = dom::html_element_by_id(&document, CANVAS_ROOT_ID)
            .ok_or_else(|| anyhow!("missing #{}", CANVAS_ROOT_ID))?;
        let design = &self.config.design;

        let (scale, narrow) = match *self.layout.borrow() {
            Some(state) => (state.scale, state.narrow),
            None => {
                // no pass has completed yet: read back what is applied
                let applied = dom::computed_style(&canvas, "transform").unwrap_or_default();
                let viewport = dom::viewport_width()?;
                (parse_transform_scale(&applied), design.is_narrow(viewport))
            }
        };

        let layer = ensure_layer(&document)?;
        let origin = frame_origin(&dom::rect_of(&canvas), &dom::rect_of(&layer));
        let placements = place_frames(&self.config.frames, origin, scale, narrow);
        for placement in &placements {
            let img = ensure_image(&document, &layer, &placement.id, &placement.src)?;
            dom::apply_styles(&img, &style::frame_styles(placement))?;
        }
        for frame in self.config.frames.frames().iter().filter(|f| !f.visible) {
            let dom_id = format!("{}{}", OVERLAY_IMAGE_PREFIX, frame.id);
            if let Some(stale) = document.get_element_by_id(&dom_id) {
                stale.remove();
            }
        }
        Ok(placements.len())
    }

    fn render_logged(&self, reason: &str) {
        match self.render() {
            Ok(n) => log::debug!("[overlay] {} render: {} frames", reason, n),
            Err(e) => {
                log::error!("[overlay] {} render failed: {:?}", reason, e);
                self.diagnostics
                    .error("overlay", format!("{} render failed: {}", reason, e));
            }
        }
    }
}

fn schedule(weak: &Weak<Inner>, reason: &'static str) {
    let Some(inner) = weak.upgrade() else { return };
    let weak = weak.clone();
    let timeout = Timeout::new(inner.debounce_ms, move || {
        if let Some(inner) = weak.upgrade() {
            inner.render_logged(reason);
        }
    });
    *inner.debounce.borrow_mut() = Some(timeout);
}

impl OverlayRenderer {
    pub fn new(
        config: Rc<SiteConfig>,
        layout: LayoutCell,
        params: &TierParams,
        diagnostics: Rc<Diagnostics>,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                layout,
                diagnostics,
                debounce_ms: params.overlay_debounce_ms,
                debounce: RefCell::new(None),
            }),
            listeners: Vec::new(),
            size_watch: None,
        }
    }

    /// Immediate render, used after each layout pass.
    pub fn render_now(&self, reason: &str) {
        self.inner.render_logged(reason);
    }

    /// A callback suitable for [`crate::zoom::ZoomController::subscribe`].
    pub fn layout_hook(&self) -> impl Fn(&canvas_core::LayoutState) + 'static {
        let weak = Rc::downgrade(&self.inner);
        move |_state: &canvas_core::LayoutState| {
            if let Some(inner) = weak.upgrade() {
                inner.render_logged("layout");
            }
        }
    }

    pub fn start(&mut self, observe_canvas: bool) -> anyhow::Result<()> {
        let window = web::window().ok_or_else(|| anyhow!("no window"))?;
        for event in ["resize", "orientationchange"] {
            let weak = Rc::downgrade(&self.inner);
            let reason: &'static str = event;
            self.listeners.push(EventListener::new(&window, event, move |_| {
                schedule(&weak, reason);
            }));
        }
        if observe_canvas {
            self.size_watch = self.watch_canvas_size();
        }
        self.render_now("init");
        Ok(())
    }

    fn watch_canvas_size(&self) -> Option<SizeWatch> {
        let document = dom::window_document()?;
        let canvas = document.get_element_by_id(CANVAS_ROOT_ID)?;
        let weak = Rc::downgrade(&self.inner);
        let callback = Closure::<dyn FnMut()>::new(move || schedule(&weak, "size-change"));
        let observer = web::ResizeObserver::new(callback.as_ref().unchecked_ref()).ok()?;
        observer.observe(&canvas);
        Some(SizeWatch {
            observer,
            _callback: callback,
        })
    }

    pub fn teardown(&mut self) {
        self.listeners.clear();
        self.size_watch.take();
        self.inner.debounce.borrow_mut().take();
    }
}
