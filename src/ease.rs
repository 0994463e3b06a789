#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Ease {
    Linear,
    /// CSS `ease-in-out`: cubic-bezier(0.42, 0, 0.58, 1).
    InOut,
    /// Material standard curve: cubic-bezier(0.4, 0, 0.2, 1).
    Standard,
    /// Back-out overshoot: cubic-bezier(0.34, 1.56, 0.64, 1).
    BackOut,
    /// Strong anticipate/overshoot: cubic-bezier(0.68, -0.55, 0.265, 1.55).
    Overshoot,
    /// Gentle deceleration: cubic-bezier(0.25, 0.46, 0.45, 0.94).
    DecelOut,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InOut => unit_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::Standard => unit_bezier(0.4, 0.0, 0.2, 1.0, t),
            Self::BackOut => unit_bezier(0.34, 1.56, 0.64, 1.0, t),
            Self::Overshoot => unit_bezier(0.68, -0.55, 0.265, 1.55, t),
            Self::DecelOut => unit_bezier(0.25, 0.46, 0.45, 0.94, t),
        }
    }

    /// The equivalent CSS timing-function token. Exported keyframe blocks use
    /// this so declarative playback matches the live interpolation curve.
    pub fn css_timing(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::InOut => "ease-in-out",
            Self::Standard => "cubic-bezier(0.4, 0, 0.2, 1)",
            Self::BackOut => "cubic-bezier(0.34, 1.56, 0.64, 1)",
            Self::Overshoot => "cubic-bezier(0.68, -0.55, 0.265, 1.55)",
            Self::DecelOut => "cubic-bezier(0.25, 0.46, 0.45, 0.94)",
        }
    }
}

/// Evaluate y for the CSS cubic-bezier((x1,y1),(x2,y2)) timing curve at
/// progress `t` (which parameterizes x). Solves x(s) = t for the bezier
/// parameter s by Newton iteration with a bisection fallback, then returns
/// y(s). Endpoints are exact.
fn unit_bezier(x1: f64, y1: f64, x2: f64, y2: f64, t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;
    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample_x = |s: f64| ((ax * s + bx) * s + cx) * s;
    let sample_y = |s: f64| ((ay * s + by) * s + cy) * s;
    let sample_dx = |s: f64| (3.0 * ax * s + 2.0 * bx) * s + cx;

    let mut s = t;
    for _ in 0..8 {
        let x = sample_x(s) - t;
        if x.abs() < 1e-7 {
            return sample_y(s);
        }
        let d = sample_dx(s);
        if d.abs() < 1e-6 {
            break;
        }
        s -= x / d;
    }

    let (mut lo, mut hi) = (0.0f64, 1.0f64);
    s = t;
    while hi - lo > 1e-7 {
        if sample_x(s) < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    sample_y(s)
}
