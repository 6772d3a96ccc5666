use crate::constants::{CANVAS_ROOT_ID, CANVAS_WRAPPER_ID, DIAGNOSTICS_STORAGE_KEY, SCROLL_ROOT_ID};
use crate::dom;
use canvas_core::{DiagnosticKind, DiagnosticLog};
use gloo::events::EventListener;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

struct MutationWatch {
    observer: web::MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array)>,
}

impl Drop for MutationWatch {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

struct LongTaskWatch {
    observer: web::PerformanceObserver,
    _callback: Closure<dyn FnMut(web::PerformanceObserverEntryList)>,
}

impl Drop for LongTaskWatch {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// Browser side of the diagnostic stream: global error hooks, a mutation
/// watch on the layout-critical nodes, a long-task observer and
/// localStorage persistence.
pub struct Diagnostics {
    log: RefCell<DiagnosticLog>,
    listeners: RefCell<Vec<EventListener>>,
    watch: RefCell<Option<MutationWatch>>,
    long_tasks: RefCell<Option<LongTaskWatch>>,
    dom_mutations: Cell<u64>,
}

fn local_storage() -> Option<web::Storage> {
    web::window().and_then(|w| w.local_storage().ok().flatten())
}

impl Diagnostics {
    pub fn new() -> Rc<Self> {
        let mut log = DiagnosticLog::default();
        let stored = local_storage().and_then(|s| s.get_item(DIAGNOSTICS_STORAGE_KEY).ok().flatten());
        if let Some(previous) = stored {
            match log.restore(&previous) {
                Ok(n) if n > 0 => log::warn!(
                    "[diag] restored {} entries from a previous session; call export_diagnostics()",
                    n
                ),
                Ok(_) => {}
                Err(e) => log::warn!("[diag] discarding unreadable stored log: {}", e),
            }
        }
        Rc::new(Self {
            log: RefCell::new(log),
            listeners: RefCell::new(Vec::new()),
            watch: RefCell::new(None),
            long_tasks: RefCell::new(None),
            dom_mutations: Cell::new(0),
        })
    }

    pub fn record(&self, kind: DiagnosticKind, component: &str, message: impl Into<String>) {
        self.log
            .borrow_mut()
            .record(dom::now_ms(), kind, component, message);
        if kind == DiagnosticKind::Error {
            self.persist();
        }
    }

    #[inline]
    pub fn error(&self, component: &str, message: impl Into<String>) {
        self.record(DiagnosticKind::Error, component, message);
    }

    #[inline]
    pub fn info(&self, component: &str, message: impl Into<String>) {
        self.record(DiagnosticKind::Info, component, message);
    }

    pub fn record_pass_duration(&self, component: &str, duration_ms: f64) {
        let slow = self
            .log
            .borrow_mut()
            .record_pass_duration(dom::now_ms(), component, duration_ms);
        if slow {
            log::debug!("[diag] {} pass took {:.1}ms", component, duration_ms);
        }
    }

    fn record_long_task(&self, entry: &web::PerformanceEntry, threshold_ms: f64) {
        let recorded = self.log.borrow_mut().record_long_task(
            dom::now_ms(),
            &entry.entry_type(),
            &entry.name(),
            entry.duration(),
            threshold_ms,
        );
        if recorded {
            log::debug!("[diag] long task: {:.1}ms", entry.duration());
        }
    }

    pub fn dom_mutations(&self) -> u64 {
        self.dom_mutations.get()
    }

    pub fn export_json(&self) -> String {
        self.log.borrow().to_json()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
        self.dom_mutations.set(0);
        if let Some(storage) = local_storage() {
            _ = storage.remove_item(DIAGNOSTICS_STORAGE_KEY);
        }
    }

    fn persist(&self) {
        if let Some(storage) = local_storage() {
            let json = self.log.borrow().to_json();
            if storage.set_item(DIAGNOSTICS_STORAGE_KEY, &json).is_err() {
                log::warn!("[diag] localStorage write failed");
            }
        }
    }

    /// Hook window errors, watch the layout-critical nodes and report main
    /// thread tasks longer than `long_task_threshold_ms`.
    pub fn install(self: &Rc<Self>, document: &web::Document, long_task_threshold_ms: f64) {
        let Some(window) = web::window() else {
            return;
        };
        let mut listeners = Vec::new();

        let weak = Rc::downgrade(self);
        listeners.push(EventListener::new(&window, "error", move |event| {
            let Some(diag) = weak.upgrade() else { return };
            let message = match event.dyn_ref::<web::ErrorEvent>() {
                Some(e) => format!("{} ({}:{})", e.message(), e.filename(), e.lineno()),
                None => "resource failed to load".to_string(),
            };
            diag.error("window", message);
        }));

        let weak = Rc::downgrade(self);
        listeners.push(EventListener::new(&window, "unhandledrejection", move |event| {
            let Some(diag) = weak.upgrade() else { return };
            let reason = event
                .dyn_ref::<web::PromiseRejectionEvent>()
                .map(|e| format!("{:?}", e.reason()))
                .unwrap_or_default();
            diag.error("promise", format!("unhandled rejection {}", reason));
        }));
        *self.listeners.borrow_mut() = listeners;

        self.watch_layout_nodes(document);
        self.watch_long_tasks(long_task_threshold_ms);
    }

    fn watch_layout_nodes(self: &Rc<Self>, document: &web::Document) {
        let weak = Rc::downgrade(self);
        let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |records: js_sys::Array| {
            let Some(diag) = weak.upgrade() else { return };
            let n = records.length() as u64;
            diag.dom_mutations.set(diag.dom_mutations.get() + n);
            diag.record(
                DiagnosticKind::Dom,
                "layout-nodes",
                format!("{} mutation(s), {} total", n, diag.dom_mutations.get()),
            );
        });
        let observer = match web::MutationObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(o) => o,
            Err(e) => {
                log::warn!("[diag] MutationObserver unavailable: {:?}", e);
                return;
            }
        };
        let init = web::MutationObserverInit::new();
        init.set_attributes(true);
        init.set_child_list(true);
        for id in [CANVAS_ROOT_ID, CANVAS_WRAPPER_ID, SCROLL_ROOT_ID] {
            if let Some(el) = document.get_element_by_id(id) {
                if let Err(e) = observer.observe_with_options(&el, &init) {
                    log::warn!("[diag] cannot observe #{}: {:?}", id, e);
                }
            }
        }
        *self.watch.borrow_mut() = Some(MutationWatch {
            observer,
            _callback: callback,
        });
    }

    fn watch_long_tasks(self: &Rc<Self>, threshold_ms: f64) {
        let weak = Rc::downgrade(self);
        let callback = Closure::<dyn FnMut(web::PerformanceObserverEntryList)>::new(
            move |list: web::PerformanceObserverEntryList| {
                let Some(diag) = weak.upgrade() else { return };
                for entry in list.get_entries().iter() {
                    if let Ok(entry) = entry.dyn_into::<web::PerformanceEntry>() {
                        diag.record_long_task(&entry, threshold_ms);
                    }
                }
            },
        );
        let observer = match web::PerformanceObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(o) => o,
            Err(e) => {
                log::warn!("[diag] PerformanceObserver unavailable: {:?}", e);
                return;
            }
        };
        // plain object so the init works across web-sys dictionary APIs
        let init = js_sys::Object::new();
        let entry_types = js_sys::Array::of1(&JsValue::from_str("longtask"));
        if js_sys::Reflect::set(&init, &JsValue::from_str("entryTypes"), &entry_types).is_err() {
            return;
        }
        // browsers without long-task timing ignore the entry type
        _ = observer.observe_with_options(init.unchecked_ref::<web::PerformanceObserverInit>());
        *self.long_tasks.borrow_mut() = Some(LongTaskWatch {
            observer,
            _callback: callback,
        });
    }

    pub fn teardown(&self) {
        self.listeners.borrow_mut().clear();
        self.watch.borrow_mut().take();
        self.long_tasks.borrow_mut().take();
        log::info!(
            "[diag] detached after {} DOM mutations, {} errors",
            self.dom_mutations(),
            self.log.borrow().error_count()
        );
    }
}
