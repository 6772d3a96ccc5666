//! Recover the applied scale from a computed CSS `transform` value.
//!
//! Only used when no [`crate::layout::LayoutState`] has been handed over yet.
//! Anything unparseable means "no displacement", i.e. scale 1.

fn parse_args(body: &str) -> Option<Vec<f64>> {
    body.split(',')
        .map(|part| part.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect()
}

fn call_args<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    let rest = value.strip_prefix(name)?.trim_start();
    let rest = rest.strip_prefix('(')?;
    rest.strip_suffix(')')
}

/// Horizontal scale encoded in `value`, if it can be read.
pub fn try_parse_transform_scale(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() || value == "none" {
        return Some(1.0);
    }
    let scale = if let Some(body) = call_args(value, "matrix3d") {
        let m = parse_args(body)?;
        if m.len() != 16 {
            return None;
        }
        (m[0] * m[0] + m[1] * m[1] + m[2] * m[2]).sqrt()
    } else if let Some(body) = call_args(value, "matrix") {
        let m = parse_args(body)?;
        if m.len() != 6 {
            return None;
        }
        (m[0] * m[0] + m[1] * m[1]).sqrt()
    } else if let Some(body) = call_args(value, "scale") {
        let m = parse_args(body)?;
        *m.first()?
    } else {
        return None;
    };
    (scale.is_finite() && scale > 0.0).then_some(scale)
}

#[inline]
pub fn parse_transform_scale(value: &str) -> f64 {
    try_parse_transform_scale(value).unwrap_or(1.0)
}
