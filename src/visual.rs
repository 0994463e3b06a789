//! Pure per-shape visual state and the presentation-sync step.
//!
//! The sequencer never touches markup: it computes [`ShapeVisual`] values
//! (pose + stroke/fill/glow) as plain data, and [`project_document`]
//! projects those values onto a document as attributes and inline style.
//! Any other rendering surface can consume the same data.

use std::fmt::Write as _;

use crate::config::{AnimationConfig, DisplayOptions};
use crate::dom::{Document, Element, Node};
use crate::inventory::Shape;
use crate::style;

/// Style-driven pose channels. `None` means the channel is not driven by
/// the active style and stays untouched on the rendered shape.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    pub dash: Option<DashPose>,
    pub opacity: Option<f64>,
    pub scale: Option<f64>,
    pub translate_y: Option<f64>,
    pub rotation_deg: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DashPose {
    pub array: f64,
    pub offset: f64,
}

impl Pose {
    /// Channel-wise interpolation between two poses. A channel present on
    /// only one side snaps to the side that has it.
    pub fn lerp(a: &Pose, b: &Pose, t: f64) -> Pose {
        fn mix(a: Option<f64>, b: Option<f64>, t: f64) -> Option<f64> {
            match (a, b) {
                (Some(x), Some(y)) => Some(x + (y - x) * t),
                (None, y) => y,
                (x, None) => x,
            }
        }
        let dash = match (a.dash, b.dash) {
            (Some(x), Some(y)) => Some(DashPose {
                array: y.array,
                offset: x.offset + (y.offset - x.offset) * t,
            }),
            (None, y) => y,
            (x, None) => x,
        };
        Pose {
            dash,
            opacity: mix(a.opacity, b.opacity, t),
            scale: mix(a.scale, b.scale, t),
            translate_y: mix(a.translate_y, b.translate_y, t),
            rotation_deg: mix(a.rotation_deg, b.rotation_deg, t),
        }
    }
}

/// The complete computed presentation of one shape.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeVisual {
    pub stroke: String,
    pub stroke_width: f64,
    pub fill: String,
    pub glow_radius: f64,
    pub pulse_overlay: bool,
    pub pose: Pose,
    /// Transient stroke replacement driven by the rainbow ramp.
    pub stroke_override: Option<String>,
}

/// The baseline (pre-run) visual for a shape under the given config.
/// Shapes without computable length ignore the style pose and sit fully
/// transparent, waiting for the fallback fade.
pub fn baseline(shape: &Shape, cfg: &AnimationConfig) -> ShapeVisual {
    let pose = if shape.has_length() {
        (style::spec(cfg.style).baseline)(shape)
    } else {
        Pose {
            opacity: Some(0.0),
            ..Pose::default()
        }
    };
    ShapeVisual {
        stroke: cfg.stroke_color.clone(),
        stroke_width: cfg.stroke_width,
        fill: if cfg.show_fill {
            shape.original_fill.clone()
        } else {
            "none".to_string()
        },
        glow_radius: cfg.glow_radius,
        pulse_overlay: cfg.pulse_overlay,
        pose,
        stroke_override: None,
    }
}

/// The fully-revealed visual for a shape under the given config.
pub fn resting(shape: &Shape, cfg: &AnimationConfig) -> ShapeVisual {
    let pose = if shape.has_length() {
        (style::spec(cfg.style).target)(shape)
    } else {
        Pose {
            opacity: Some(1.0),
            ..Pose::default()
        }
    };
    ShapeVisual {
        pose,
        ..baseline(shape, cfg)
    }
}

pub fn baselines(shapes: &[Shape], cfg: &AnimationConfig) -> Vec<ShapeVisual> {
    shapes.iter().map(|s| baseline(s, cfg)).collect()
}

/// A live trail ghost: a translucent, thicker copy of a shape spawned
/// mid-draw and discarded shortly after.
#[derive(Clone, Debug, PartialEq)]
pub struct TrailGhost {
    pub shape_index: usize,
    pub expires_at: f64,
}

const OVERLAY_MARK: &str = "data-inkflow";

/// Project visual state onto the document: per-shape attributes and inline
/// style, display sizing, rotate/pulse overlay rules, and trail ghosts.
/// Fully idempotent; previously projected overlay nodes are removed first.
pub fn project_document(
    doc: &mut Document,
    visuals: &[ShapeVisual],
    trails: &[TrailGhost],
    cfg: &AnimationConfig,
    display: &DisplayOptions,
) {
    strip_projection(doc);

    doc.root.set_attr("width", format!("{}px", display.size_px));
    doc.root.set_attr("height", format!("{}px", display.size_px));
    if cfg.rotate {
        doc.root
            .set_attr("style", "animation: ink-spin 10s linear infinite");
    } else {
        doc.root.remove_attr("style");
    }

    doc.root.visit_drawables_mut(&mut |i, el| {
        if let Some(visual) = visuals.get(i) {
            apply_visual(el, visual);
        }
    });

    // Trail ghosts render beneath their source shape. Ghosts are drawable
    // themselves, so insertion runs highest ordinal first to keep the
    // remaining ordinals stable.
    let mut pending: Vec<(usize, Element)> = Vec::new();
    doc.root.visit_drawables(&mut |i, el| {
        for _ in trails.iter().filter(|t| t.shape_index == i) {
            pending.push((i, el.clone()));
        }
    });
    pending.sort_by(|a, b| b.0.cmp(&a.0));
    for (index, source) in pending {
        let mut ghost = source;
        ghost.set_attr(OVERLAY_MARK, "trail");
        ghost.set_attr("stroke", format!("{}40", cfg.stroke_color));
        ghost.set_attr("stroke-width", fmt_num(cfg.stroke_width * 1.5));
        ghost.set_attr("style", "animation: ink-trail-fade 2s ease-out forwards");
        doc.root.insert_before_drawable(index, ghost);
    }

    if let Some(rules) = overlay_rules(cfg, !trails.is_empty()) {
        let mut style_el = Element::new("style");
        style_el.set_attr(OVERLAY_MARK, "overlay");
        style_el.children.push(Node::Text(rules));
        doc.root.prepend_child(style_el);
    }
}

/// Remove everything a previous projection injected.
fn strip_projection(doc: &mut Document) {
    fn prune(el: &mut Element) {
        el.children.retain(|child| match child {
            Node::Element(e) => e.attr(OVERLAY_MARK).is_none(),
            Node::Text(_) => true,
        });
        for child in &mut el.children {
            if let Node::Element(e) = child {
                prune(e);
            }
        }
    }
    prune(&mut doc.root);
}

fn apply_visual(el: &mut Element, visual: &ShapeVisual) {
    let stroke = visual.stroke_override.as_deref().unwrap_or(&visual.stroke);
    el.set_attr("stroke", stroke);
    el.set_attr("stroke-width", fmt_num(visual.stroke_width));
    el.set_attr("stroke-linecap", "round");
    el.set_attr("stroke-linejoin", "round");
    el.set_attr("fill", visual.fill.clone());
    el.set_attr("style", inline_style(visual, stroke));
}

/// Deterministic inline style string for the dynamic channels, so repeated
/// projection writes byte-identical markup.
fn inline_style(visual: &ShapeVisual, stroke: &str) -> String {
    let mut out = String::new();
    let pose = &visual.pose;
    if let Some(dash) = pose.dash {
        let _ = write!(
            out,
            "stroke-dasharray: {}; stroke-dashoffset: {}; ",
            fmt_num(dash.array),
            fmt_num(dash.offset)
        );
    }
    if let Some(opacity) = pose.opacity {
        let _ = write!(out, "opacity: {}; ", fmt_num(opacity));
    }
    let mut transform = String::new();
    if let Some(y) = pose.translate_y {
        let _ = write!(transform, "translateY({}px) ", fmt_num(y));
    }
    if let Some(deg) = pose.rotation_deg {
        let _ = write!(transform, "rotate({}deg) ", fmt_num(deg));
    }
    if let Some(scale) = pose.scale {
        let _ = write!(transform, "scale({}) ", fmt_num(scale));
    }
    if !transform.is_empty() {
        let _ = write!(
            out,
            "transform: {}; transform-origin: center; transform-box: fill-box; ",
            transform.trim_end()
        );
    }
    if visual.glow_radius > 0.0 {
        let _ = write!(
            out,
            "filter: drop-shadow(0 0 {}px {}); ",
            fmt_num(visual.glow_radius),
            stroke
        );
    }
    if visual.pulse_overlay {
        out.push_str("animation: ink-pulse 2s ease-in-out infinite; ");
    }
    out.trim_end().to_string()
}

fn overlay_rules(cfg: &AnimationConfig, has_trails: bool) -> Option<String> {
    let mut rules = String::new();
    if cfg.rotate {
        rules.push_str(
            "@keyframes ink-spin { from { transform: rotate(0deg); } to { transform: rotate(360deg); } } ",
        );
    }
    if cfg.pulse_overlay {
        rules.push_str(
            "@keyframes ink-pulse { 0%, 100% { opacity: 1; } 50% { opacity: 0.6; } } ",
        );
    }
    if has_trails {
        rules.push_str("@keyframes ink-trail-fade { to { opacity: 0; } } ");
    }
    let rules = rules.trim_end();
    (!rules.is_empty()).then(|| rules.to_string())
}

/// Trim trailing zeros so projected values are stable and compact.
pub fn fmt_num(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{v:.4}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnimationStyle;
    use crate::inventory::ShapeKind;

    fn shape(index: usize, len: f64) -> Shape {
        Shape {
            index,
            kind: ShapeKind::Path,
            total_length: len,
            original_fill: "#ff0000".to_string(),
        }
    }

    fn cfg(style: AnimationStyle) -> AnimationConfig {
        AnimationConfig {
            style,
            ..AnimationConfig::default()
        }
    }

    #[test]
    fn draw_baseline_hides_via_dash() {
        let v = baseline(&shape(0, 120.0), &cfg(AnimationStyle::Draw));
        assert_eq!(
            v.pose.dash,
            Some(DashPose {
                array: 120.0,
                offset: 120.0
            })
        );
        assert_eq!(v.pose.opacity, None);
    }

    #[test]
    fn zero_length_baseline_is_transparent_for_every_style() {
        for style in AnimationStyle::ALL {
            let v = baseline(&shape(0, 0.0), &cfg(style));
            assert_eq!(v.pose.opacity, Some(0.0));
            assert_eq!(v.pose.dash, None);
        }
    }

    #[test]
    fn show_fill_false_promotes_configured_stroke() {
        let v = baseline(&shape(0, 10.0), &cfg(AnimationStyle::Draw));
        assert_eq!(v.fill, "none");
        assert_eq!(v.stroke, "#8b5cf6");

        let mut c = cfg(AnimationStyle::Draw);
        c.show_fill = true;
        let v = baseline(&shape(0, 10.0), &c);
        assert_eq!(v.fill, "#ff0000");
    }

    #[test]
    fn pose_lerp_interpolates_channels() {
        let a = Pose {
            dash: Some(DashPose {
                array: 100.0,
                offset: 100.0,
            }),
            opacity: Some(0.0),
            ..Pose::default()
        };
        let b = Pose {
            dash: Some(DashPose {
                array: 100.0,
                offset: 0.0,
            }),
            opacity: Some(1.0),
            ..Pose::default()
        };
        let mid = Pose::lerp(&a, &b, 0.5);
        assert_eq!(mid.dash.unwrap().offset, 50.0);
        assert_eq!(mid.opacity, Some(0.5));
    }

    #[test]
    fn projection_is_idempotent() {
        let src = r##"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0 L10 0" fill="#ff0000"/></svg>"##;
        let mut doc = Document::parse(src).unwrap();
        let c = cfg(AnimationStyle::Draw);
        let shapes = crate::inventory::build(&doc, &c);
        let visuals = baselines(&shapes, &c);
        let display = DisplayOptions::default();

        project_document(&mut doc, &visuals, &[], &c, &display);
        let once = doc.to_xml();
        project_document(&mut doc, &visuals, &[], &c, &display);
        assert_eq!(doc.to_xml(), once);
    }

    #[test]
    fn projection_writes_stroke_and_dash() {
        let src = r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0 L10 0"/></svg>"#;
        let mut doc = Document::parse(src).unwrap();
        let c = cfg(AnimationStyle::Draw);
        let shapes = crate::inventory::build(&doc, &c);
        let visuals = baselines(&shapes, &c);
        project_document(&mut doc, &visuals, &[], &c, &DisplayOptions::default());
        let xml = doc.to_xml();
        assert!(xml.contains(r##"stroke="#8b5cf6""##));
        assert!(xml.contains("stroke-dasharray: 10"));
        assert!(xml.contains("stroke-dashoffset: 10"));
        assert!(xml.contains(r#"width="300px""#));
    }

    #[test]
    fn trail_ghosts_are_replaced_not_accumulated() {
        let src = r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0 L10 0"/></svg>"#;
        let mut doc = Document::parse(src).unwrap();
        let mut c = cfg(AnimationStyle::Draw);
        c.trail_overlay = true;
        let shapes = crate::inventory::build(&doc, &c);
        let visuals = baselines(&shapes, &c);
        let trails = vec![TrailGhost {
            shape_index: 0,
            expires_at: 5.0,
        }];
        project_document(&mut doc, &visuals, &trails, &c, &DisplayOptions::default());
        project_document(&mut doc, &visuals, &trails, &c, &DisplayOptions::default());
        let xml = doc.to_xml();
        assert_eq!(xml.matches("data-inkflow=\"trail\"").count(), 1);
    }
}
