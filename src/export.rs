//! SVG export serialization.
//!
//! Both exporters operate on a detached clone of the live document: the
//! animated export strips per-shape animation state and injects one global
//! declarative rule block whose keyframes come from the same style table
//! the live sequencer interpolates with; the static export strips
//! everything and leaves the shapes fully revealed.

use std::fmt::Write as _;

use crate::config::AnimationConfig;
use crate::dom::{Document, Element, Node};
use crate::style::{self, KeyframeCtx};
use crate::visual::fmt_num;

/// Reveal duration of an exported animation at speed 1.
pub const ANIMATED_BASE_DURATION_SECS: f64 = 4.0;

pub const SVG_MEDIA_TYPE: &str = "image/svg+xml";
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// A downloadable export: name, media type, and encoded content.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Display name with a trailing `.svg` removed, for filename composition.
pub fn base_name(file_name: &str) -> &str {
    let trimmed = file_name.trim();
    if trimmed.to_ascii_lowercase().ends_with(".svg") {
        &trimmed[..trimmed.len() - 4]
    } else {
        trimmed
    }
}

pub fn animated_file_name(file_name: &str, cfg: &AnimationConfig) -> String {
    format!(
        "{}_animated_{}{}.svg",
        base_name(file_name),
        cfg.style.name(),
        if cfg.looping { "_loop" } else { "" }
    )
}

pub fn static_file_name(file_name: &str) -> String {
    format!("{}_static.svg", base_name(file_name))
}

pub fn raster_file_name(file_name: &str, size_px: u32) -> String {
    format!("{}_{}x{}.png", base_name(file_name), size_px, size_px)
}

/// Self-contained animated document. The timing math mirrors live playback:
/// reveal takes `4 / speed` seconds; when looping, one declarative cycle is
/// reveal plus rest, with the reveal keyframe landing at `reveal / cycle`.
pub fn animated_svg(live: &Document, file_name: &str, cfg: &AnimationConfig) -> Artifact {
    let mut doc = live.clone();
    strip_animation_state(&mut doc, false);

    let reveal = ANIMATED_BASE_DURATION_SECS / cfg.speed_multiplier;
    let total = if cfg.looping {
        reveal + cfg.rest_seconds
    } else {
        reveal
    };
    let fill_pct = if cfg.looping {
        reveal / total * 100.0
    } else {
        100.0
    };

    let spec = style::spec(cfg.style);
    let keyframes = (spec.keyframes)(&KeyframeCtx {
        fill_pct,
        looping: cfg.looping,
        stroke_color: cfg.stroke_color.clone(),
    });

    let mut rules = keyframes;
    let _ = write!(
        rules,
        " path, circle, rect, ellipse, line, polyline, polygon {{ animation: {} {}s {} {};",
        style::keyframes_name(cfg.style),
        fmt_num(total),
        spec.ease.css_timing(),
        if cfg.looping { "infinite" } else { "forwards" }
    );
    if style::uses_dash(cfg.style) {
        rules.push_str(" stroke-dasharray: 1000;");
    }
    let _ = write!(
        rules,
        " stroke: {}; stroke-width: {}; fill: {}; stroke-linecap: round; stroke-linejoin: round;",
        cfg.stroke_color,
        fmt_num(cfg.stroke_width),
        if cfg.show_fill { "currentColor" } else { "none" }
    );
    if cfg.glow_radius > 0.0 {
        let _ = write!(
            rules,
            " filter: drop-shadow(0 0 {}px {});",
            fmt_num(cfg.glow_radius),
            cfg.stroke_color
        );
    }
    rules.push_str(" }");

    let mut style_el = Element::new("style");
    style_el.children.push(Node::Text(rules));
    doc.root.prepend_child(style_el);

    Artifact {
        file_name: animated_file_name(file_name, cfg),
        media_type: SVG_MEDIA_TYPE,
        bytes: doc.to_xml().into_bytes(),
    }
}

/// Fully-revealed document with no animation state at all.
pub fn static_svg(live: &Document, file_name: &str) -> Artifact {
    let mut doc = live.clone();
    strip_animation_state(&mut doc, true);
    Artifact {
        file_name: static_file_name(file_name),
        media_type: SVG_MEDIA_TYPE,
        bytes: doc.to_xml().into_bytes(),
    }
}

/// Remove every per-shape animation override the projection wrote, plus the
/// injected overlay and trail nodes. `reveal` additionally forces shapes
/// visible (the static export's contract).
fn strip_animation_state(doc: &mut Document, reveal: bool) {
    fn prune_injected(el: &mut Element) {
        el.children.retain(|child| match child {
            Node::Element(e) => e.attr("data-inkflow").is_none(),
            Node::Text(_) => true,
        });
        for child in &mut el.children {
            if let Node::Element(e) = child {
                prune_injected(e);
            }
        }
    }
    prune_injected(&mut doc.root);

    doc.root.visit_elements_mut(&mut |el| {
        for attr in [
            "style",
            "stroke-dasharray",
            "stroke-dashoffset",
            "transform",
            "opacity",
        ] {
            el.remove_attr(attr);
        }
    });
    if reveal {
        doc.root.visit_drawables_mut(&mut |_, el| {
            el.set_attr("opacity", "1");
        });
    }
}
