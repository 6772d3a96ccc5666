use crate::style::StyleList;
use anyhow::anyhow;
use canvas_core::CanvasBox;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

#[inline]
pub fn html_element_by_id(document: &web::Document, id: &str) -> Option<web::HtmlElement> {
    document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<web::HtmlElement>().ok())
}

#[inline]
pub fn js_err(e: wasm_bindgen::JsValue) -> anyhow::Error {
    anyhow!("{:?}", e)
}

pub fn apply_styles(el: &web::HtmlElement, styles: &StyleList) -> anyhow::Result<()> {
    let css = el.style();
    for (property, value) in styles {
        css.set_property(property, value).map_err(js_err)?;
    }
    Ok(())
}

#[inline]
pub fn set_style(el: &web::HtmlElement, property: &str, value: &str) -> anyhow::Result<()> {
    el.style().set_property(property, value).map_err(js_err)
}

pub fn computed_style(el: &web::Element, property: &str) -> Option<String> {
    let window = web::window()?;
    let css = window.get_computed_style(el).ok()??;
    css.get_property_value(property).ok()
}

pub fn rect_of(el: &web::Element) -> CanvasBox {
    let r = el.get_bounding_client_rect();
    CanvasBox::new(r.left(), r.top(), r.width(), r.height())
}

/// Layout width of the viewport, excluding a vertical scrollbar.
pub fn viewport_width() -> anyhow::Result<f64> {
    let window = web::window().ok_or_else(|| anyhow!("no window"))?;
    let client = window
        .document()
        .and_then(|d| d.document_element())
        .map(|e| e.client_width() as f64)
        .unwrap_or(0.0);
    if client > 0.0 {
        return Ok(client);
    }
    window
        .inner_width()
        .map_err(js_err)?
        .as_f64()
        .ok_or_else(|| anyhow!("innerWidth is not a number"))
}

fn offset_parent_html(el: &web::HtmlElement) -> Option<web::HtmlElement> {
    el.offset_parent()
        .and_then(|p| p.dyn_into::<web::HtmlElement>().ok())
}

/// Sum of `offsetTop` up the offset-parent chain, stopping at `stop` when it
/// is part of the chain. Offsets are layout values and ignore transforms.
fn offset_top_until(el: &web::HtmlElement, stop: Option<&web::HtmlElement>) -> (f64, bool) {
    let mut top = 0.0;
    let mut current = Some(el.clone());
    while let Some(node) = current {
        if let Some(stop) = stop {
            let stop_node: &web::Node = stop.as_ref();
            if node.is_same_node(Some(stop_node)) {
                return (top, true);
            }
        }
        top += node.offset_top() as f64;
        current = offset_parent_html(&node);
    }
    (top, false)
}

/// Bottom edge of `el` in unscaled pixels, measured from the top of `root`.
/// `None` when `el` is not rendered (no offset parent or an empty box).
pub fn offset_bottom_within(el: &web::HtmlElement, root: &web::HtmlElement) -> Option<f64> {
    if el.offset_parent().is_none() || el.offset_height() <= 0 {
        return None;
    }
    let (top, reached_root) = offset_top_until(el, Some(root));
    let top = if reached_root {
        top
    } else {
        // root is not an offset parent: both offsets are document-relative
        top - offset_top_until(root, None).0
    };
    Some(top + el.offset_height() as f64)
}

#[inline]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}
