//! Fixed-zoom controller.
//!
//! Fits the canvas root to the viewport with one uniform `scale()` and
//! clamps the wrapper to the exact scaled content height ("hard cut"). A
//! pass is cheap and idempotent, so every event that can invalidate the
//! layout simply runs another one; the [`TierParams`] decide how many.

use crate::constants::{
    CANVAS_ROOT_ID, CANVAS_WRAPPER_ID, FINAL_SECTION_ID, READY_EVENT, READY_GLOBAL_FLAG,
    SCROLL_ROOT_ID,
};
use crate::diagnostics::Diagnostics;
use crate::dom;
use crate::style;
use anyhow::anyhow;
use canvas_core::{
    compute_layout, compute_scale, LayoutSample, LayoutState, Measurement, ReadyLatch,
    RetryPolicy, ScrollMode, SettleDetector, SettleVerdict, SiteConfig, Tier, TierParams,
};
use gloo::events::EventListener;
use gloo::render::{request_animation_frame, AnimationFrame};
use gloo::timers::callback::Timeout;
use instant::Instant;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

pub type LayoutCell = Rc<RefCell<Option<LayoutState>>>;
type Subscriber = Box<dyn Fn(&LayoutState)>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadyDetail {
    scale: f64,
    document_height: f64,
    effective_design_width: f64,
}

struct Inner {
    config: Rc<SiteConfig>,
    params: TierParams,
    layout: LayoutCell,
    diagnostics: Rc<Diagnostics>,
    ready: RefCell<ReadyLatch>,
    subscribers: RefCell<Vec<Subscriber>>,
    // pending work; replacing a slot cancels what was there
    resize_debounce: RefCell<Option<Timeout>>,
    observer_debounce: RefCell<Option<Timeout>>,
    settle_timer: RefCell<Option<Timeout>>,
    frame: RefCell<Option<AnimationFrame>>,
    fixed_timers: RefCell<Vec<Timeout>>,
    settle: RefCell<Option<SettleDetector>>,
    passes: Cell<u64>,
    torn_down: Cell<bool>,
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

pub struct ZoomController {
    inner: Rc<Inner>,
    listeners: Vec<EventListener>,
    size_watch: Option<SizeWatch>,
}

impl Inner {
    fn run_pass(&self, reason: &str) -> Option<LayoutState> {
        if self.torn_down.get() {
            return None;
        }
        let started = Instant::now();
        let result = self.try_pass();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.diagnostics.record_pass_duration("zoom", elapsed_ms);
        self.passes.set(self.passes.get() + 1);
        match result {
            Ok(state) => {
                log::debug!(
                    "[zoom] {} pass: scale={:.4} height={}px ({:?})",
                    reason,
                    state.scale,
                    state.document_height,
                    state.height_source
                );
                *self.layout.borrow_mut() = Some(state);
                for subscriber in self.subscribers.borrow().iter() {
                    subscriber(&state);
                }
                if self.ready.borrow_mut().fire() {
                    self.announce_ready(&state);
                }
                Some(state)
            }
            Err(e) => {
                log::error!("[zoom] {} pass failed: {:?}", reason, e);
                self.diagnostics
                    .error("zoom", format!("{} pass failed: {}", reason, e));
                None
            }
        }
    }

    /// Resolve every node and the scale before the first write, so a missing
    /// node leaves the previous transform and height in place. The width is
    /// written before the heights are measured because they depend on it.
    fn try_pass(&self) -> anyhow::Result<LayoutState> {
        let design = &self.config.design;
        let document = dom::window_document().ok_or_else(|| anyhow!("no document"))?;
        let canvas = dom::html_element_by_id(&document, CANVAS_ROOT_ID)
            .ok_or_else(|| anyhow!("missing #{}", CANVAS_ROOT_ID))?;
        let wrapper = dom::html_element_by_id(&document, CANVAS_WRAPPER_ID)
            .or_else(|| {
                canvas
                    .parent_element()
                    .and_then(|p| p.dyn_into::<web::HtmlElement>().ok())
            })
            .ok_or_else(|| anyhow!("missing #{}", CANVAS_WRAPPER_ID))?;
        let sentinel = dom::html_element_by_id(&document, FINAL_SECTION_ID);
        let scroll_root = dom::html_element_by_id(&document, SCROLL_ROOT_ID);
        let scroll_mode = match (&scroll_root, self.params.tier) {
            (Some(_), Tier::Aggressive | Tier::Moderate) => ScrollMode::Container,
            _ => ScrollMode::Window,
        };
        let viewport = dom::viewport_width()?;
        let scale = compute_scale(viewport, design)?;

        dom::apply_styles(
            &canvas,
            &style::canvas_width_style(scale.effective_design_width),
        )?;

        let sentinel_bottom = sentinel
            .as_ref()
            .and_then(|sentinel| dom::offset_bottom_within(sentinel, &canvas));
        if sentinel_bottom.is_none() {
            log::debug!(
                "[zoom] #{} missing or not rendered, using fallback height",
                FINAL_SECTION_ID
            );
        }
        let sample = LayoutSample {
            natural_height: canvas.offset_height() as f64,
            sentinel_bottom,
            scroll_mode,
        };
        let plan = compute_layout(viewport, design, &self.config.frames, &sample)?;

        dom::apply_styles(
            &canvas,
            &style::canvas_transform_styles(&plan, self.params.transform_hints),
        )?;
        dom::apply_styles(&wrapper, &style::wrapper_styles(plan.height.height))?;
        self.clip_horizontal(&document, scroll_root.as_ref(), scroll_mode)?;

        Ok(plan.into_state(dom::rect_of(&canvas)))
    }

    fn clip_horizontal(
        &self,
        document: &web::Document,
        scroll_root: Option<&web::HtmlElement>,
        mode: ScrollMode,
    ) -> anyhow::Result<()> {
        let clip = style::horizontal_clip_styles();
        match (mode, scroll_root) {
            (ScrollMode::Container, Some(root)) => dom::apply_styles(root, &clip)?,
            _ => {
                if let Some(html) = document
                    .document_element()
                    .and_then(|e| e.dyn_into::<web::HtmlElement>().ok())
                {
                    dom::apply_styles(&html, &clip)?;
                }
                if let Some(body) = document.body() {
                    dom::apply_styles(&body, &clip)?;
                }
            }
        }
        Ok(())
    }

    fn announce_ready(&self, state: &LayoutState) {
        log::info!(
            "[zoom] layout ready: scale={:.4} height={}px tier={}",
            state.scale,
            state.document_height,
            self.params.tier.as_str()
        );
        self.diagnostics.info(
            "zoom",
            format!("ready scale={:.4} height={}", state.scale, state.document_height),
        );
        let Some(window) = web::window() else { return };
        _ = js_sys::Reflect::set(
            &window,
            &JsValue::from_str(READY_GLOBAL_FLAG),
            &JsValue::TRUE,
        );
        let detail = ReadyDetail {
            scale: state.scale,
            document_height: state.document_height,
            effective_design_width: state.effective_design_width,
        };
        let detail = serde_json::to_string(&detail)
            .ok()
            .and_then(|json| js_sys::JSON::parse(&json).ok())
            .unwrap_or(JsValue::NULL);
        let init = web::CustomEventInit::new();
        init.set_detail(&detail);
        match web::CustomEvent::new_with_event_init_dict(READY_EVENT, &init) {
            Ok(event) => {
                _ = window.dispatch_event(&event);
            }
            Err(e) => log::warn!("[zoom] cannot build {}: {:?}", READY_EVENT, e),
        }
    }

    fn cancel_pending(&self) {
        self.resize_debounce.borrow_mut().take();
        self.observer_debounce.borrow_mut().take();
        self.settle_timer.borrow_mut().take();
        self.frame.borrow_mut().take();
        self.fixed_timers.borrow_mut().clear();
    }
}

fn run(weak: &Weak<Inner>, reason: &str) -> Option<LayoutState> {
    weak.upgrade().and_then(|inner| inner.run_pass(reason))
}

fn debounce(slot: &RefCell<Option<Timeout>>, weak: Weak<Inner>, delay_ms: u32, reason: &'static str) {
    let timeout = Timeout::new(delay_ms, move || {
        run(&weak, reason);
    });
    *slot.borrow_mut() = Some(timeout);
}

/// Run on the next `remaining` animation frames, then hand over to the
/// settle check.
fn schedule_frames(inner: &Rc<Inner>, remaining: u8) {
    if remaining == 0 {
        schedule_settle_check(inner, 0);
        return;
    }
    let weak = Rc::downgrade(inner);
    let frame = request_animation_frame(move |_ts| {
        let Some(inner) = weak.upgrade() else { return };
        inner.run_pass("frame");
        schedule_frames(&inner, remaining - 1);
    });
    *inner.frame.borrow_mut() = Some(frame);
}

fn schedule_settle_check(inner: &Rc<Inner>, delay_ms: u32) {
    let weak = Rc::downgrade(inner);
    let timeout = Timeout::new(delay_ms, move || {
        let Some(inner) = weak.upgrade() else { return };
        let outcome = inner.run_pass("settle");
        let verdict = inner.settle.borrow_mut().as_mut().map(|d| match outcome {
            Some(state) => d.observe(Measurement {
                scale: state.scale,
                document_height: state.document_height,
            }),
            None => d.observe_failure(),
        });
        match verdict {
            Some(SettleVerdict::Retry { delay_ms }) => schedule_settle_check(&inner, delay_ms),
            Some(SettleVerdict::Stable) => {
                log::debug!("[zoom] layout settled after {} passes", inner.passes.get())
            }
            Some(SettleVerdict::GaveUp) => {
                log::warn!("[zoom] layout did not settle; keeping last result");
                inner
                    .diagnostics
                    .record(canvas_core::DiagnosticKind::Warning, "zoom", "settle gave up");
            }
            None => {}
        }
    });
    *inner.settle_timer.borrow_mut() = Some(timeout);
}

/// Start (or restart) the start-up convergence burst for this tier.
fn converge(inner: &Rc<Inner>) {
    match &inner.params.retry {
        RetryPolicy::Settle(params) => {
            *inner.settle.borrow_mut() = Some(SettleDetector::new(*params));
            schedule_frames(inner, params.animation_frames);
        }
        RetryPolicy::Fixed { delays_ms } => {
            let timers = delays_ms
                .iter()
                .map(|&delay| {
                    let weak = Rc::downgrade(inner);
                    Timeout::new(delay, move || {
                        run(&weak, "deferred");
                    })
                })
                .collect();
            *inner.fixed_timers.borrow_mut() = timers;
        }
    }
}

impl ZoomController {
    pub fn new(config: Rc<SiteConfig>, params: TierParams, diagnostics: Rc<Diagnostics>) -> Self {
        let inner = Rc::new(Inner {
            config,
            params,
            layout: Rc::new(RefCell::new(None)),
            diagnostics,
            ready: RefCell::new(ReadyLatch::default()),
            subscribers: RefCell::new(Vec::new()),
            resize_debounce: RefCell::new(None),
            observer_debounce: RefCell::new(None),
            settle_timer: RefCell::new(None),
            frame: RefCell::new(None),
            fixed_timers: RefCell::new(Vec::new()),
            settle: RefCell::new(None),
            passes: Cell::new(0),
            torn_down: Cell::new(false),
        });
        Self {
            inner,
            listeners: Vec::new(),
            size_watch: None,
        }
    }

    /// Shared view of the latest layout, for the overlay renderer.
    pub fn layout_cell(&self) -> LayoutCell {
        self.inner.layout.clone()
    }

    pub fn current(&self) -> Option<LayoutState> {
        *self.inner.layout.borrow()
    }

    /// Called after every successful pass, in registration order.
    pub fn subscribe(&self, f: impl Fn(&LayoutState) + 'static) {
        self.inner.subscribers.borrow_mut().push(Box::new(f));
    }

    pub fn run_now(&self, reason: &str) -> Option<LayoutState> {
        self.inner.run_pass(reason)
    }

    /// Run the first pass and install every re-trigger.
    pub fn start(&mut self) -> anyhow::Result<()> {
        let window = web::window().ok_or_else(|| anyhow!("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| anyhow!("no document"))?;
        let params = self.inner.params.clone();
        log::info!(
            "[zoom] starting: tier={} observer={} hints={} resize_debounce={}ms startup_passes<={}",
            params.tier.as_str(),
            params.observer_enabled,
            params.transform_hints,
            params.resize_debounce_ms,
            params.max_startup_passes()
        );

        self.inner.run_pass("init");
        converge(&self.inner);

        let weak = Rc::downgrade(&self.inner);
        self.listeners.push(EventListener::new(&window, "resize", move |_| {
            if let Some(inner) = weak.upgrade() {
                debounce(
                    &inner.resize_debounce,
                    Rc::downgrade(&inner),
                    inner.params.resize_debounce_ms,
                    "resize",
                );
            }
        }));

        let weak = Rc::downgrade(&self.inner);
        self.listeners
            .push(EventListener::new(&window, "orientationchange", move |_| {
                if let Some(inner) = weak.upgrade() {
                    // let the platform finish rotating before measuring
                    debounce(
                        &inner.resize_debounce,
                        Rc::downgrade(&inner),
                        inner.params.orientation_delay_ms,
                        "orientation",
                    );
                }
            }));

        let weak = Rc::downgrade(&self.inner);
        self.listeners.push(EventListener::once(&window, "load", move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.run_pass("load");
                if matches!(inner.params.retry, RetryPolicy::Settle(_)) {
                    converge(&inner);
                }
            }
        }));

        self.watch_fonts(&document);
        if params.observer_enabled {
            self.size_watch = self.watch_canvas_size(&document);
        }
        Ok(())
    }

    fn watch_fonts(&self, document: &web::Document) {
        let ready = match document.fonts().ready() {
            Ok(promise) => promise,
            Err(e) => {
                log::debug!("[zoom] document.fonts.ready unavailable: {:?}", e);
                return;
            }
        };
        let weak = Rc::downgrade(&self.inner);
        spawn_local(async move {
            if JsFuture::from(ready).await.is_err() {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.run_pass("fonts");
                if matches!(inner.params.retry, RetryPolicy::Settle(_)) {
                    converge(&inner);
                }
            }
        });
    }

    fn watch_canvas_size(&self, document: &web::Document) -> Option<SizeWatch> {
        let canvas = document.get_element_by_id(CANVAS_ROOT_ID)?;
        let weak = Rc::downgrade(&self.inner);
        let callback = Closure::<dyn FnMut()>::new(move || {
            if let Some(inner) = weak.upgrade() {
                debounce(
                    &inner.observer_debounce,
                    Rc::downgrade(&inner),
                    inner.params.observer_debounce_ms,
                    "size-change",
                );
            }
        });
        let observer = match web::ResizeObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(o) => o,
            Err(e) => {
                log::warn!("[zoom] ResizeObserver unavailable: {:?}", e);
                return None;
            }
        };
        observer.observe(&canvas);
        Some(SizeWatch {
            observer,
            _callback: callback,
        })
    }

    /// Detach every listener, cancel every timer, disconnect the observer.
    pub fn teardown(&mut self) {
        self.inner.torn_down.set(true);
        self.listeners.clear();
        self.size_watch.take();
        self.inner.cancel_pending();
        self.inner.subscribers.borrow_mut().clear();
        log::info!("[zoom] torn down after {} passes", self.inner.passes.get());
    }
}

impl Drop for ZoomController {
    fn drop(&mut self) {
        if !self.inner.torn_down.get() {
            self.teardown();
        }
    }
}
