use crate::constants::{
    ANCHOR_ATTRIBUTE, ANCHOR_FRAME_Z_INDEX, ANCHOR_REVEAL_TRANSITION, SCROLL_ROOT_ID,
};
use crate::diagnostics::Diagnostics;
use crate::dom;
use crate::style;
use anyhow::anyhow;
use canvas_core::{place_anchor_frame, AnchorFrameConfig, AnchorFrames, AnchorRect};
use gloo::events::{EventListener, EventListenerOptions};
use gloo::render::{request_animation_frame, AnimationFrame};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use web_sys as web;

struct Inner {
    frames: AnchorFrames,
    diagnostics: Rc<Diagnostics>,
    pending: RefCell<Option<AnimationFrame>>,
}

/// Keeps anchor-tracked frames glued to the content they decorate.
pub struct AnchorBridge {
    inner: Rc<Inner>,
    listeners: Vec<EventListener>,
}

fn ensure_frame_image(
    document: &web::Document,
    config: &AnchorFrameConfig,
) -> anyhow::Result<web::HtmlImageElement> {
    let id = config.frame_element_id();
    if let Some(el) = document.get_element_by_id(&id) {
        return el
            .dyn_into::<web::HtmlImageElement>()
            .map_err(|_| anyhow!("#{} is not an <img>", id));
    }
    let body = document.body().ok_or_else(|| anyhow!("no body"))?;
    let img: web::HtmlImageElement = document
        .create_element("img")
        .map_err(dom::js_err)?
        .dyn_into()
        .map_err(|_| anyhow!("img is not an HtmlImageElement"))?;
    img.set_id(&id);
    img.set_alt("");
    img.set_src(&config.src);
    _ = img.set_attribute("aria-hidden", "true");
    dom::apply_styles(
        &img,
        &vec![
            ("position", "fixed".to_string()),
            ("pointer-events", "none".to_string()),
            ("opacity", "0".to_string()),
            ("transition", ANCHOR_REVEAL_TRANSITION.to_string()),
            ("z-index", ANCHOR_FRAME_Z_INDEX.to_string()),
        ],
    )?;
    body.append_child(&img).map_err(dom::js_err)?;
    Ok(img)
}

impl Inner {
    fn sync(&self) -> anyhow::Result<(usize, usize)> {
        let document = dom::window_document().ok_or_else(|| anyhow!("no document"))?;
        let anchors = document
            .query_selector_all(&format!("[{}]", ANCHOR_ATTRIBUTE))
            .map_err(dom::js_err)?;
        let mut shown = 0;
        for i in 0..anchors.length() {
            let Some(anchor) = anchors
                .item(i)
                .and_then(|n| n.dyn_into::<web::Element>().ok())
            else {
                continue;
            };
            let Some(name) = anchor.get_attribute(ANCHOR_ATTRIBUTE) else {
                continue;
            };
            let config = self.frames.config_for(&name);
            let img = ensure_frame_image(&document, &config)?;
            let r = anchor.get_bounding_client_rect();
            let rect = AnchorRect {
                left: r.left(),
                top: r.top(),
                width: r.width(),
                height: r.height(),
            };
            match place_anchor_frame(&rect, &config) {
                Some(placement) => {
                    // position first; revealing an unpositioned frame makes it jump
                    dom::apply_styles(&img, &style::anchor_frame_styles(&placement))?;
                    dom::set_style(&img, "opacity", "1")?;
                    shown += 1;
                }
                None => dom::set_style(&img, "opacity", "0")?,
            }
        }
        Ok((shown, anchors.length() as usize))
    }

    fn sync_logged(&self, reason: &str) {
        match self.sync() {
            Ok((shown, total)) => {
                log::trace!("[anchors] {} sync: {}/{} frames shown", reason, shown, total)
            }
            Err(e) => {
                log::error!("[anchors] {} sync failed: {:?}", reason, e);
                self.diagnostics
                    .error("anchors", format!("{} sync failed: {}", reason, e));
            }
        }
    }
}

/// Coalesce bursts of scroll events into one sync per animation frame.
fn request_sync(weak: &Weak<Inner>) {
    let Some(inner) = weak.upgrade() else { return };
    if inner.pending.borrow().is_some() {
        return;
    }
    let weak = weak.clone();
    let frame = request_animation_frame(move |_ts| {
        if let Some(inner) = weak.upgrade() {
            inner.pending.borrow_mut().take();
            inner.sync_logged("frame");
        }
    });
    *inner.pending.borrow_mut() = Some(frame);
}

impl AnchorBridge {
    pub fn new(frames: AnchorFrames, diagnostics: Rc<Diagnostics>) -> Self {
        Self {
            inner: Rc::new(Inner {
                frames,
                diagnostics,
                pending: RefCell::new(None),
            }),
            listeners: Vec::new(),
        }
    }

    pub fn sync_now(&self, reason: &str) {
        self.inner.sync_logged(reason);
    }

    pub fn layout_hook(&self) -> impl Fn(&canvas_core::LayoutState) + 'static {
        let weak = Rc::downgrade(&self.inner);
        move |_state: &canvas_core::LayoutState| request_sync(&weak)
    }

    pub fn start(&mut self) -> anyhow::Result<()> {
        let window = web::window().ok_or_else(|| anyhow!("no window"))?;
        // default options: bubble phase, passive
        let passive = EventListenerOptions::default();

        for event in ["scroll", "resize"] {
            let weak = Rc::downgrade(&self.inner);
            self.listeners.push(EventListener::new_with_options(
                &window,
                event,
                passive,
                move |_| request_sync(&weak),
            ));
        }
        // the anchors move with the internal container too
        if let Some(scroller) = dom::window_document()
            .and_then(|d| d.get_element_by_id(SCROLL_ROOT_ID))
        {
            let weak = Rc::downgrade(&self.inner);
            self.listeners.push(EventListener::new_with_options(
                &scroller,
                "scroll",
                passive,
                move |_| request_sync(&weak),
            ));
        }
        self.sync_now("init");
        Ok(())
    }

    pub fn teardown(&mut self) {
        self.listeners.clear();
        self.inner.pending.borrow_mut().take();
    }
}
