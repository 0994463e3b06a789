//! Geometric path length per drawable primitive.
//!
//! Mirrors what a renderer's `getTotalLength()` reports: path data is parsed
//! into a bezier path and arc-length integrated; the analytic primitives use
//! their perimeter formulas. `None` means the geometry is not computable
//! (malformed numbers, unparseable path data); the sequencer gives such
//! shapes a fixed-duration fade instead of a length-based draw.

use kurbo::{BezPath, Circle, Ellipse, ParamCurveArclen, Point, Shape as _};

use crate::dom::Element;

const ARCLEN_ACCURACY: f64 = 1e-3;

pub fn element_length(el: &Element) -> Option<f64> {
    match el.local_name() {
        "path" => path_length(el.attr("d")?),
        "circle" => {
            let r = num_attr(el, "r")?;
            Some(Circle::new(Point::ORIGIN, r.max(0.0)).perimeter(ARCLEN_ACCURACY))
        }
        "ellipse" => {
            let rx = num_attr(el, "rx")?;
            let ry = num_attr(el, "ry")?;
            Some(Ellipse::new(Point::ORIGIN, (rx.max(0.0), ry.max(0.0)), 0.0)
                .perimeter(ARCLEN_ACCURACY))
        }
        "rect" => {
            let w = num_attr(el, "width")?;
            let h = num_attr(el, "height")?;
            Some(2.0 * (w.max(0.0) + h.max(0.0)))
        }
        "line" => {
            let x1 = num_attr(el, "x1")?;
            let y1 = num_attr(el, "y1")?;
            let x2 = num_attr(el, "x2")?;
            let y2 = num_attr(el, "y2")?;
            Some(((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt())
        }
        "polyline" => poly_length(el.attr("points")?, false),
        "polygon" => poly_length(el.attr("points")?, true),
        _ => None,
    }
}

fn path_length(d: &str) -> Option<f64> {
    let path = BezPath::from_svg(d).ok()?;
    let mut total = 0.0;
    for seg in path.segments() {
        total += seg.arclen(ARCLEN_ACCURACY);
    }
    total.is_finite().then_some(total)
}

fn poly_length(points: &str, closed: bool) -> Option<f64> {
    let coords: Vec<f64> = points
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(parse_finite)
        .collect::<Option<_>>()?;

    // An odd trailing coordinate is dropped, as renderers do.
    let pts: Vec<Point> = coords
        .chunks_exact(2)
        .map(|c| Point::new(c[0], c[1]))
        .collect();
    if pts.len() < 2 {
        return Some(0.0);
    }

    let mut total: f64 = pts.windows(2).map(|w| w[0].distance(w[1])).sum();
    if closed {
        total += pts[pts.len() - 1].distance(pts[0]);
    }
    Some(total)
}

/// Missing attributes take the SVG default of zero; present-but-unparseable
/// or non-finite values poison the whole computation.
fn num_attr(el: &Element, name: &str) -> Option<f64> {
    match el.attr(name) {
        None => Some(0.0),
        Some(raw) => parse_finite(raw),
    }
}

fn parse_finite(raw: &str) -> Option<f64> {
    let v: f64 = raw.trim().trim_end_matches("px").parse().ok()?;
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(name: &str, attrs: &[(&str, &str)]) -> Element {
        let mut e = Element::new(name);
        for (k, v) in attrs {
            e.set_attr(k, *v);
        }
        e
    }

    #[test]
    fn circle_length_is_circumference() {
        let len = element_length(&el("circle", &[("r", "10")])).unwrap();
        assert!((len - 2.0 * std::f64::consts::PI * 10.0).abs() < 1e-2);
    }

    #[test]
    fn rect_length_is_perimeter() {
        let len = element_length(&el("rect", &[("width", "30"), ("height", "20")])).unwrap();
        assert_eq!(len, 100.0);
    }

    #[test]
    fn line_length_is_euclidean() {
        let len = element_length(&el(
            "line",
            &[("x1", "0"), ("y1", "0"), ("x2", "3"), ("y2", "4")],
        ))
        .unwrap();
        assert!((len - 5.0).abs() < 1e-9);
    }

    #[test]
    fn path_length_integrates_segments() {
        let len = element_length(&el("path", &[("d", "M 0 0 L 3 4 L 3 0")])).unwrap();
        assert!((len - 9.0).abs() < 1e-6);
    }

    #[test]
    fn polygon_adds_closing_segment() {
        let open = element_length(&el("polyline", &[("points", "0,0 10,0 10,10")])).unwrap();
        let closed = element_length(&el("polygon", &[("points", "0,0 10,0 10,10")])).unwrap();
        assert!((open - 20.0).abs() < 1e-9);
        assert!((closed - open - (200.0f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn malformed_geometry_is_not_computable() {
        assert!(element_length(&el("path", &[("d", "Q garbage")])).is_none());
        assert!(element_length(&el("circle", &[("r", "wide")])).is_none());
        assert!(element_length(&el("polyline", &[("points", "1,2 x,4")])).is_none());
    }

    #[test]
    fn missing_attributes_default_to_zero() {
        assert_eq!(element_length(&el("rect", &[])).unwrap(), 0.0);
        assert_eq!(element_length(&el("circle", &[])).unwrap(), 0.0);
    }

    #[test]
    fn non_drawable_has_no_length() {
        assert!(element_length(&el("g", &[])).is_none());
        assert!(element_length(&el("path", &[])).is_none());
    }
}
