use crate::error::{InkflowError, InkflowResult};

/// The fixed set of animation styles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationStyle {
    Draw,
    Fade,
    Scale,
    Bounce,
    Wave,
    Spiral,
    Pulse,
    Elastic,
    Rainbow,
}

impl AnimationStyle {
    pub const ALL: [Self; 9] = [
        Self::Draw,
        Self::Fade,
        Self::Scale,
        Self::Bounce,
        Self::Wave,
        Self::Spiral,
        Self::Pulse,
        Self::Elastic,
        Self::Rainbow,
    ];

    /// Lowercase token used in filenames and exported animation names.
    pub fn name(self) -> &'static str {
        match self {
            Self::Draw => "draw",
            Self::Fade => "fade",
            Self::Scale => "scale",
            Self::Bounce => "bounce",
            Self::Wave => "wave",
            Self::Spiral => "spiral",
            Self::Pulse => "pulse",
            Self::Elastic => "elastic",
            Self::Rainbow => "rainbow",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.name() == name.trim().to_ascii_lowercase())
    }
}

/// User-facing animation parameters. Mutated only through [`ConfigPatch`];
/// the sequencer and exporters read snapshots and never write back.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationConfig {
    pub speed_multiplier: f64,
    pub stroke_color: String,
    pub stroke_width: f64,
    pub glow_radius: f64,
    pub style: AnimationStyle,
    pub show_fill: bool,
    pub rotate: bool,
    pub pulse_overlay: bool,
    pub trail_overlay: bool,
    pub looping: bool,
    pub rest_seconds: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 5.0,
            stroke_color: "#8b5cf6".to_string(),
            stroke_width: 2.0,
            glow_radius: 3.0,
            style: AnimationStyle::Bounce,
            show_fill: false,
            rotate: false,
            pulse_overlay: false,
            trail_overlay: false,
            looping: false,
            rest_seconds: 1.0,
        }
    }
}

impl AnimationConfig {
    pub fn validate(&self) -> InkflowResult<()> {
        if !self.speed_multiplier.is_finite() || self.speed_multiplier <= 0.0 {
            return Err(InkflowError::config("speed_multiplier must be > 0"));
        }
        if !self.stroke_width.is_finite() || self.stroke_width <= 0.0 {
            return Err(InkflowError::config("stroke_width must be > 0"));
        }
        if !self.glow_radius.is_finite() || self.glow_radius < 0.0 {
            return Err(InkflowError::config("glow_radius must be >= 0"));
        }
        if !self.rest_seconds.is_finite() || self.rest_seconds < 0.0 {
            return Err(InkflowError::config("rest_seconds must be >= 0"));
        }
        if self.stroke_color.trim().is_empty() {
            return Err(InkflowError::config("stroke_color must be non-empty"));
        }
        Ok(())
    }
}

/// Partial config update, deserializable from a UI shell's JSON patch.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub speed_multiplier: Option<f64>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f64>,
    pub glow_radius: Option<f64>,
    pub style: Option<AnimationStyle>,
    pub show_fill: Option<bool>,
    pub rotate: Option<bool>,
    pub pulse_overlay: Option<bool>,
    pub trail_overlay: Option<bool>,
    pub looping: Option<bool>,
    pub rest_seconds: Option<f64>,
}

impl ConfigPatch {
    pub fn apply(&self, cfg: &mut AnimationConfig) {
        if let Some(v) = self.speed_multiplier {
            cfg.speed_multiplier = v;
        }
        if let Some(v) = &self.stroke_color {
            cfg.stroke_color = v.clone();
        }
        if let Some(v) = self.stroke_width {
            cfg.stroke_width = v;
        }
        if let Some(v) = self.glow_radius {
            cfg.glow_radius = v;
        }
        if let Some(v) = self.style {
            cfg.style = v;
        }
        if let Some(v) = self.show_fill {
            cfg.show_fill = v;
        }
        if let Some(v) = self.rotate {
            cfg.rotate = v;
        }
        if let Some(v) = self.pulse_overlay {
            cfg.pulse_overlay = v;
        }
        if let Some(v) = self.trail_overlay {
            cfg.trail_overlay = v;
        }
        if let Some(v) = self.looping {
            cfg.looping = v;
        }
        if let Some(v) = self.rest_seconds {
            cfg.rest_seconds = v;
        }
    }

    /// Whether the patch changes the visual baseline, meaning styling must
    /// be re-applied and any active run restarted from Idle. Speed only
    /// affects the next run and the trail overlay only affects future
    /// spawns, so neither invalidates the current one.
    pub fn restarts_playback(&self) -> bool {
        self.stroke_color.is_some()
            || self.stroke_width.is_some()
            || self.glow_radius.is_some()
            || self.style.is_some()
            || self.show_fill.is_some()
            || self.rotate.is_some()
            || self.pulse_overlay.is_some()
            || self.looping.is_some()
            || self.rest_seconds.is_some()
    }
}

/// Preview-surface options; the raster export reads both fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DisplayOptions {
    pub size_px: u32,
    pub dark_mode: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            size_px: 300,
            dark_mode: true,
        }
    }
}

impl DisplayOptions {
    pub fn validate(&self) -> InkflowResult<()> {
        if self.size_px == 0 || self.size_px > 4096 {
            return Err(InkflowError::config("size_px must be in 1..=4096"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        AnimationConfig::default().validate().unwrap();
        DisplayOptions::default().validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = AnimationConfig::default();
        cfg.speed_multiplier = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = AnimationConfig::default();
        cfg.stroke_width = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = AnimationConfig::default();
        cfg.glow_radius = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = AnimationConfig::default();
        cfg.stroke_color = "  ".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let mut cfg = AnimationConfig::default();
        let patch = ConfigPatch {
            style: Some(AnimationStyle::Draw),
            speed_multiplier: Some(1.0),
            ..ConfigPatch::default()
        };
        patch.apply(&mut cfg);
        assert_eq!(cfg.style, AnimationStyle::Draw);
        assert_eq!(cfg.speed_multiplier, 1.0);
        assert_eq!(cfg.stroke_color, "#8b5cf6");
    }

    #[test]
    fn speed_only_patch_does_not_restart() {
        let patch = ConfigPatch {
            speed_multiplier: Some(2.0),
            trail_overlay: Some(true),
            ..ConfigPatch::default()
        };
        assert!(!patch.restarts_playback());

        let patch = ConfigPatch {
            glow_radius: Some(5.0),
            ..ConfigPatch::default()
        };
        assert!(patch.restarts_playback());
    }

    #[test]
    fn patch_deserializes_from_partial_json() {
        let patch: ConfigPatch =
            serde_json::from_str(r#"{"style":"rainbow","looping":true}"#).unwrap();
        assert_eq!(patch.style, Some(AnimationStyle::Rainbow));
        assert_eq!(patch.looping, Some(true));
        assert!(patch.stroke_color.is_none());
    }

    #[test]
    fn style_names_roundtrip() {
        for style in AnimationStyle::ALL {
            assert_eq!(AnimationStyle::from_name(style.name()), Some(style));
        }
        assert_eq!(AnimationStyle::from_name("sparkle"), None);
    }
}
