//! Per-style strategy table.
//!
//! One row per animation style: baseline pose, target pose, easing curve,
//! and keyframe generator for the animated export. Live interpolation and
//! exported keyframes consume the same row, so the two cannot drift. Adding
//! a style means adding one row.

use std::fmt::Write as _;

use crate::config::AnimationStyle;
use crate::ease::Ease;
use crate::inventory::Shape;
use crate::visual::{DashPose, Pose, fmt_num};

/// The stroke ramp cycled by the rainbow style before snapping back to the
/// configured color.
pub const RAINBOW_RAMP: [&str; 12] = [
    "#ff0000", "#ff8000", "#ffff00", "#80ff00", "#00ff00", "#00ff80", "#00ffff", "#0080ff",
    "#0000ff", "#8000ff", "#ff00ff", "#ff0080",
];

pub struct StyleSpec {
    pub style: AnimationStyle,
    pub ease: Ease,
    pub baseline: fn(&Shape) -> Pose,
    pub target: fn(&Shape) -> Pose,
    pub keyframes: fn(&KeyframeCtx) -> String,
}

/// Inputs for keyframe generation. `fill_pct` is where the reveal lands:
/// 100 for a one-shot export, `anim / (anim + rest) * 100` when looping.
pub struct KeyframeCtx {
    pub fill_pct: f64,
    pub looping: bool,
    pub stroke_color: String,
}

pub fn spec(style: AnimationStyle) -> &'static StyleSpec {
    TABLE
        .iter()
        .find(|row| row.style == style)
        .expect("every style has a table row")
}

/// Name of the keyframes block each style's exported animation references.
pub fn keyframes_name(style: AnimationStyle) -> &'static str {
    match style {
        AnimationStyle::Draw => "ink-draw",
        AnimationStyle::Fade => "ink-fade",
        AnimationStyle::Scale | AnimationStyle::Bounce | AnimationStyle::Elastic => "ink-scale-in",
        AnimationStyle::Wave => "ink-wave",
        AnimationStyle::Spiral => "ink-spiral",
        AnimationStyle::Pulse => "ink-pulse-in",
        AnimationStyle::Rainbow => "ink-rainbow",
    }
}

/// Styles that reveal through the dash channel rather than opacity.
pub fn uses_dash(style: AnimationStyle) -> bool {
    matches!(style, AnimationStyle::Draw | AnimationStyle::Rainbow)
}

static TABLE: [StyleSpec; 9] = [
    StyleSpec {
        style: AnimationStyle::Draw,
        ease: Ease::Standard,
        baseline: dash_hidden,
        target: dash_revealed,
        keyframes: kf_draw,
    },
    StyleSpec {
        style: AnimationStyle::Fade,
        ease: Ease::InOut,
        baseline: opacity_hidden,
        target: opacity_shown,
        keyframes: kf_fade,
    },
    StyleSpec {
        style: AnimationStyle::Scale,
        ease: Ease::BackOut,
        baseline: scale_hidden,
        target: scale_shown,
        keyframes: kf_scale_in,
    },
    StyleSpec {
        style: AnimationStyle::Bounce,
        ease: Ease::Overshoot,
        baseline: scale_hidden,
        target: scale_shown,
        keyframes: kf_scale_in,
    },
    StyleSpec {
        style: AnimationStyle::Wave,
        ease: Ease::InOut,
        baseline: wave_hidden,
        target: wave_shown,
        keyframes: kf_wave,
    },
    StyleSpec {
        style: AnimationStyle::Spiral,
        ease: Ease::DecelOut,
        baseline: spiral_hidden,
        target: spiral_shown,
        keyframes: kf_spiral,
    },
    StyleSpec {
        style: AnimationStyle::Pulse,
        ease: Ease::InOut,
        baseline: scale_hidden,
        target: scale_shown,
        keyframes: kf_pulse,
    },
    StyleSpec {
        style: AnimationStyle::Elastic,
        ease: Ease::Overshoot,
        baseline: scale_hidden,
        target: scale_shown,
        keyframes: kf_scale_in,
    },
    StyleSpec {
        style: AnimationStyle::Rainbow,
        ease: Ease::Standard,
        baseline: dash_hidden,
        target: dash_revealed,
        keyframes: kf_rainbow,
    },
];

fn dash_hidden(shape: &Shape) -> Pose {
    Pose {
        dash: Some(DashPose {
            array: shape.total_length,
            offset: shape.total_length,
        }),
        ..Pose::default()
    }
}

fn dash_revealed(shape: &Shape) -> Pose {
    Pose {
        dash: Some(DashPose {
            array: shape.total_length,
            offset: 0.0,
        }),
        ..Pose::default()
    }
}

fn opacity_hidden(_: &Shape) -> Pose {
    Pose {
        opacity: Some(0.0),
        ..Pose::default()
    }
}

fn opacity_shown(_: &Shape) -> Pose {
    Pose {
        opacity: Some(1.0),
        ..Pose::default()
    }
}

fn scale_hidden(_: &Shape) -> Pose {
    Pose {
        opacity: Some(0.0),
        scale: Some(0.0),
        ..Pose::default()
    }
}

fn scale_shown(_: &Shape) -> Pose {
    Pose {
        opacity: Some(1.0),
        scale: Some(1.0),
        ..Pose::default()
    }
}

fn wave_hidden(_: &Shape) -> Pose {
    Pose {
        opacity: Some(0.0),
        translate_y: Some(20.0),
        rotation_deg: Some(0.0),
        ..Pose::default()
    }
}

// Each shape settles at its own tilt, giving the wave its ripple.
fn wave_shown(shape: &Shape) -> Pose {
    Pose {
        opacity: Some(1.0),
        translate_y: Some(0.0),
        rotation_deg: Some((shape.index as f64).sin() * 10.0),
        ..Pose::default()
    }
}

fn spiral_hidden(_: &Shape) -> Pose {
    Pose {
        opacity: Some(0.0),
        scale: Some(0.0),
        rotation_deg: Some(0.0),
        ..Pose::default()
    }
}

fn spiral_shown(_: &Shape) -> Pose {
    Pose {
        opacity: Some(1.0),
        scale: Some(1.0),
        rotation_deg: Some(360.0),
        ..Pose::default()
    }
}

fn two_stop(name: &str, from: &str, to: &str, ctx: &KeyframeCtx) -> String {
    let mut out = format!(
        "@keyframes {name} {{ 0% {{ {from} }} {}% {{ {to} }}",
        fmt_num(ctx.fill_pct)
    );
    if ctx.looping {
        let _ = write!(out, " 100% {{ {to} }}");
    }
    out.push_str(" }");
    out
}

fn kf_draw(ctx: &KeyframeCtx) -> String {
    two_stop(
        "ink-draw",
        "stroke-dashoffset: 1000;",
        "stroke-dashoffset: 0;",
        ctx,
    )
}

fn kf_fade(ctx: &KeyframeCtx) -> String {
    two_stop("ink-fade", "opacity: 0;", "opacity: 1;", ctx)
}

fn kf_scale_in(ctx: &KeyframeCtx) -> String {
    // Shared by scale/bounce/elastic; the timing function differentiates
    // them in the emitted animation shorthand.
    two_stop(
        "ink-scale-in",
        "opacity: 0; transform: scale(0);",
        "opacity: 1; transform: scale(1);",
        ctx,
    )
}

fn kf_wave(ctx: &KeyframeCtx) -> String {
    two_stop(
        "ink-wave",
        "opacity: 0; transform: translateY(20px) rotate(0deg);",
        "opacity: 1; transform: translateY(0) rotate(10deg);",
        ctx,
    )
}

fn kf_spiral(ctx: &KeyframeCtx) -> String {
    two_stop(
        "ink-spiral",
        "opacity: 0; transform: scale(0) rotate(0deg);",
        "opacity: 1; transform: scale(1) rotate(360deg);",
        ctx,
    )
}

fn kf_pulse(ctx: &KeyframeCtx) -> String {
    let mut out = format!(
        "@keyframes ink-pulse-in {{ 0% {{ opacity: 0; transform: scale(0); }} 50% {{ opacity: 1; transform: scale(1.1); }} {}% {{ opacity: 1; transform: scale(1); }}",
        fmt_num(ctx.fill_pct)
    );
    if ctx.looping {
        out.push_str(" 100% { opacity: 1; transform: scale(1); }");
    }
    out.push_str(" }");
    out
}

fn kf_rainbow(ctx: &KeyframeCtx) -> String {
    let mut out = String::from("@keyframes ink-rainbow { 0% { stroke: #ff0000; stroke-dashoffset: 1000; }");
    for (pct, color) in [
        (14, "#ff8000"),
        (28, "#ffff00"),
        (42, "#00ff00"),
        (57, "#0080ff"),
        (71, "#0000ff"),
        (85, "#8000ff"),
    ] {
        let _ = write!(out, " {pct}% {{ stroke: {color}; }}");
    }
    let _ = write!(
        out,
        " {}% {{ stroke: {}; stroke-dashoffset: 0; }}",
        fmt_num(ctx.fill_pct),
        ctx.stroke_color
    );
    if ctx.looping {
        let _ = write!(
            out,
            " 100% {{ stroke: {}; stroke-dashoffset: 0; }}",
            ctx.stroke_color
        );
    }
    out.push_str(" }");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::ShapeKind;

    fn shape(index: usize, len: f64) -> Shape {
        Shape {
            index,
            kind: ShapeKind::Path,
            total_length: len,
            original_fill: "none".to_string(),
        }
    }

    fn ctx(fill_pct: f64, looping: bool) -> KeyframeCtx {
        KeyframeCtx {
            fill_pct,
            looping,
            stroke_color: "#8b5cf6".to_string(),
        }
    }

    #[test]
    fn every_style_has_a_row() {
        for style in AnimationStyle::ALL {
            assert_eq!(spec(style).style, style);
            let css = (spec(style).keyframes)(&ctx(100.0, false));
            assert!(css.starts_with(&format!("@keyframes {} ", keyframes_name(style))));
        }
    }

    #[test]
    fn dash_styles_start_fully_hidden() {
        for style in [AnimationStyle::Draw, AnimationStyle::Rainbow] {
            let s = shape(0, 240.0);
            let base = (spec(style).baseline)(&s);
            let target = (spec(style).target)(&s);
            assert_eq!(base.dash.unwrap().offset, 240.0);
            assert_eq!(target.dash.unwrap().offset, 0.0);
            assert!(uses_dash(style));
        }
    }

    #[test]
    fn opacity_styles_fade_to_one() {
        for style in [
            AnimationStyle::Fade,
            AnimationStyle::Scale,
            AnimationStyle::Bounce,
            AnimationStyle::Wave,
            AnimationStyle::Spiral,
            AnimationStyle::Pulse,
            AnimationStyle::Elastic,
        ] {
            let s = shape(0, 50.0);
            assert_eq!((spec(style).baseline)(&s).opacity, Some(0.0));
            assert_eq!((spec(style).target)(&s).opacity, Some(1.0));
            assert!(!uses_dash(style));
        }
    }

    #[test]
    fn wave_target_tilt_depends_on_index() {
        let a = (spec(AnimationStyle::Wave).target)(&shape(1, 10.0));
        let b = (spec(AnimationStyle::Wave).target)(&shape(2, 10.0));
        assert_ne!(a.rotation_deg, b.rotation_deg);
    }

    #[test]
    fn one_shot_keyframes_end_at_hundred() {
        let css = (spec(AnimationStyle::Draw).keyframes)(&ctx(100.0, false));
        assert!(css.contains("0% { stroke-dashoffset: 1000; }"));
        assert!(css.contains("100% { stroke-dashoffset: 0; }"));
        assert_eq!(css.matches("100%").count(), 1);
    }

    #[test]
    fn looping_keyframes_hold_through_rest() {
        let css = (spec(AnimationStyle::Fade).keyframes)(&ctx(80.0, true));
        assert!(css.contains("80% { opacity: 1; }"));
        assert!(css.contains("100% { opacity: 1; }"));
    }

    #[test]
    fn rainbow_keyframes_snap_back_to_configured_color() {
        let css = (spec(AnimationStyle::Rainbow).keyframes)(&ctx(100.0, false));
        assert!(css.starts_with("@keyframes ink-rainbow"));
        assert!(css.contains("stroke: #ff8000"));
        assert!(css.contains("100% { stroke: #8b5cf6; stroke-dashoffset: 0; }"));
    }

    #[test]
    fn pulse_overshoots_mid_reveal() {
        let css = (spec(AnimationStyle::Pulse).keyframes)(&ctx(100.0, false));
        assert!(css.contains("50% { opacity: 1; transform: scale(1.1); }"));
    }
}
