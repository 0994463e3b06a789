//! Playback controller: the public surface gluing sanitizer, inventory,
//! styling, sequencer, and exporters together.
//!
//! The controller owns the document and its inventory; the sequencer owns
//! playback state; the config is replaced only through patches. Exports
//! with no loaded document are silent no-ops, and clipboard failures are
//! logged rather than surfaced.

use crate::config::{AnimationConfig, ConfigPatch, DisplayOptions};
use crate::dom::Document;
use crate::error::InkflowResult;
use crate::export::{self, Artifact, PNG_MEDIA_TYPE};
use crate::intake::{self, IntakeNotice};
use crate::inventory::{self, Shape};
use crate::raster;
use crate::sanitize::sanitize;
use crate::sequencer::{Phase, PlaybackState, Sequencer};
use crate::visual;

/// How long the copy-source success indicator stays up.
pub const COPY_NOTICE_SECS: f64 = 2.0;

/// Host clipboard seam. The engine never talks to a real clipboard itself;
/// the embedding shell installs whatever its platform provides.
pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> anyhow::Result<()>;
}

pub struct Controller {
    cfg: AnimationConfig,
    display: DisplayOptions,
    source_name: String,
    document: Option<Document>,
    shapes: Vec<Shape>,
    sequencer: Option<Sequencer>,
    clipboard: Option<Box<dyn ClipboardSink>>,
    intake_notice: IntakeNotice,
    copied_until: Option<f64>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self {
            cfg: AnimationConfig::default(),
            display: DisplayOptions::default(),
            source_name: String::new(),
            document: None,
            shapes: Vec::new(),
            sequencer: None,
            clipboard: None,
            intake_notice: IntakeNotice::Idle,
            copied_until: None,
        }
    }

    pub fn set_clipboard(&mut self, sink: Box<dyn ClipboardSink>) {
        self.clipboard = Some(sink);
    }

    /// Validate and load an upload coming through the intake boundary,
    /// recording the transient success/error notice.
    pub fn load_upload(
        &mut self,
        file_name: &str,
        declared_type: &str,
        content: &str,
        now: f64,
    ) -> bool {
        match intake::accept(file_name, declared_type, content) {
            Ok(upload) => {
                self.intake_notice = IntakeNotice::success(now);
                self.load(&upload.content, &upload.file_name, now);
                true
            }
            Err(err) => {
                self.intake_notice = IntakeNotice::error(err.to_string(), now);
                false
            }
        }
    }

    /// Replace the loaded document wholesale. The sanitized text is parsed,
    /// inventoried, and queued for its one-shot preview run. Text that is
    /// unusable even after sanitization leaves the controller empty rather
    /// than failing.
    #[tracing::instrument(skip(self, content))]
    pub fn load(&mut self, content: &str, display_name: &str, now: f64) {
        self.source_name = display_name.to_string();
        self.copied_until = None;
        let sanitized = sanitize(content);
        match Document::parse(&sanitized) {
            Ok(doc) => {
                self.shapes = inventory::build(&doc, &self.cfg);
                self.document = Some(doc);
                let mut seq = Sequencer::new(self.shapes.clone(), self.cfg.clone());
                seq.schedule_preview(now);
                self.sequencer = Some(seq);
            }
            Err(err) => {
                tracing::warn!(%err, "document unusable after sanitization");
                self.document = None;
                self.shapes = Vec::new();
                self.sequencer = None;
            }
        }
    }

    /// Apply a partial config update. Baseline-affecting changes rebuild the
    /// inventory (the fill fallback reads the stroke color) and drop the
    /// sequencer back to Idle under a fresh generation.
    pub fn set_config(&mut self, patch: &ConfigPatch, _now: f64) -> InkflowResult<()> {
        let mut next = self.cfg.clone();
        patch.apply(&mut next);
        next.validate()?;
        self.cfg = next;

        if patch.restarts_playback() {
            if let Some(doc) = &self.document {
                self.shapes = inventory::build(doc, &self.cfg);
                self.sequencer = Some(Sequencer::new(self.shapes.clone(), self.cfg.clone()));
            }
        } else if let Some(seq) = &mut self.sequencer {
            seq.set_config(self.cfg.clone(), false);
        }
        Ok(())
    }

    pub fn set_display(&mut self, display: DisplayOptions) -> InkflowResult<()> {
        display.validate()?;
        self.display = display;
        Ok(())
    }

    pub fn play(&mut self, now: f64) {
        if let Some(seq) = &mut self.sequencer {
            seq.play(now);
        }
    }

    pub fn pause(&mut self, now: f64) -> InkflowResult<()> {
        match &mut self.sequencer {
            Some(seq) => seq.pause(now),
            None => Err(crate::error::InkflowError::sequence("nothing is playing")),
        }
    }

    pub fn stop(&mut self) {
        if let Some(seq) = &mut self.sequencer {
            seq.stop();
        }
    }

    pub fn reset(&mut self) {
        if let Some(seq) = &mut self.sequencer {
            seq.reset();
        }
    }

    pub fn replay(&mut self, now: f64) {
        if let Some(seq) = &mut self.sequencer {
            seq.replay(now);
        }
    }

    /// Pump due timers.
    pub fn tick(&mut self, now: f64) {
        if let Some(seq) = &mut self.sequencer {
            seq.tick(now);
        }
    }

    /// Fire time of the next pending timer, for host scheduling.
    pub fn next_due(&mut self) -> Option<f64> {
        self.sequencer.as_mut().and_then(|s| s.next_due())
    }

    /// The loaded document with the current visual state projected onto it.
    pub fn live_document(&self, now: f64) -> Option<Document> {
        let doc = self.document.as_ref()?;
        let mut live = doc.clone();
        let (visuals, trails) = match &self.sequencer {
            Some(seq) => (seq.current_visuals(now), seq.trails().to_vec()),
            None => (visual::baselines(&self.shapes, &self.cfg), Vec::new()),
        };
        visual::project_document(&mut live, &visuals, &trails, &self.cfg, &self.display);
        Some(live)
    }

    pub fn export_animated(&self, now: f64) -> Option<Artifact> {
        let live = self.live_document(now)?;
        Some(export::animated_svg(&live, &self.source_name, &self.cfg))
    }

    pub fn export_static(&self, now: f64) -> Option<Artifact> {
        let live = self.live_document(now)?;
        Some(export::static_svg(&live, &self.source_name))
    }

    pub fn export_raster(&self, now: f64) -> Option<Artifact> {
        let live = self.live_document(now)?;
        match raster::render_png(&live.to_xml(), &self.display) {
            Ok(bytes) => Some(Artifact {
                file_name: export::raster_file_name(&self.source_name, self.display.size_px),
                media_type: PNG_MEDIA_TYPE,
                bytes,
            }),
            Err(err) => {
                tracing::warn!(%err, "raster export failed");
                None
            }
        }
    }

    /// Serialize the live document onto the host clipboard. Returns whether
    /// the write happened; failures are logged, never surfaced.
    pub fn copy_source(&mut self, now: f64) -> bool {
        let Some(live) = self.live_document(now) else {
            return false;
        };
        let text = live.to_xml();
        match &mut self.clipboard {
            Some(sink) => match sink.write_text(&text) {
                Ok(()) => {
                    self.copied_until = Some(now + COPY_NOTICE_SECS);
                    true
                }
                Err(err) => {
                    tracing::warn!(%err, "clipboard write failed");
                    false
                }
            },
            None => {
                tracing::warn!("copy requested with no clipboard sink installed");
                false
            }
        }
    }

    /// Whether the transient "copied" indicator is still showing.
    pub fn copy_feedback(&self, now: f64) -> bool {
        self.copied_until.is_some_and(|until| now < until)
    }

    pub fn phase(&self) -> Phase {
        self.sequencer
            .as_ref()
            .map_or(Phase::Idle, |s| s.state().phase)
    }

    pub fn playback(&self) -> Option<&PlaybackState> {
        self.sequencer.as_ref().map(|s| s.state())
    }

    pub fn progress_percent(&self) -> f64 {
        self.playback().map_or(0.0, |s| s.progress_percent)
    }

    pub fn loop_count(&self) -> u32 {
        self.playback().map_or(0, |s| s.loop_count)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.cfg
    }

    pub fn display(&self) -> &DisplayOptions {
        &self.display
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn intake_notice(&self, now: f64) -> IntakeNotice {
        self.intake_notice.observed(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnimationStyle;
    use crate::sequencer::SETTLE_DELAY_SECS;

    const FIXTURE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24">
        <path d="M0 0 L100 0"/>
        <circle cx="5" cy="5" r="10" fill="#ff0000"/>
    </svg>"##;

    struct RecordingClipboard(Vec<String>);

    impl ClipboardSink for RecordingClipboard {
        fn write_text(&mut self, text: &str) -> anyhow::Result<()> {
            self.0.push(text.to_string());
            Ok(())
        }
    }

    struct BrokenClipboard;

    impl ClipboardSink for BrokenClipboard {
        fn write_text(&mut self, _text: &str) -> anyhow::Result<()> {
            anyhow::bail!("denied")
        }
    }

    fn loaded() -> Controller {
        let mut c = Controller::new();
        c.load(FIXTURE, "icon.svg", 0.0);
        c
    }

    #[test]
    fn load_builds_inventory_and_queues_preview() {
        let mut c = loaded();
        assert_eq!(c.shape_count(), 2);
        assert_eq!(c.phase(), Phase::Idle);
        c.tick(SETTLE_DELAY_SECS);
        assert_eq!(c.phase(), Phase::PreviewPlaying);
    }

    #[test]
    fn intake_rejection_sets_transient_error() {
        let mut c = Controller::new();
        assert!(!c.load_upload("a.png", "image/png", FIXTURE, 0.0));
        assert!(matches!(
            c.intake_notice(0.0),
            IntakeNotice::Error { .. }
        ));
        assert_eq!(c.intake_notice(3.0), IntakeNotice::Idle);
        assert_eq!(c.shape_count(), 0);
    }

    #[test]
    fn exports_without_document_are_silent_noops() {
        let c = Controller::new();
        assert!(c.export_animated(0.0).is_none());
        assert!(c.export_static(0.0).is_none());
        assert!(c.export_raster(0.0).is_none());
    }

    #[test]
    fn export_names_follow_the_grammar() {
        let mut c = loaded();
        c.set_config(
            &ConfigPatch {
                style: Some(AnimationStyle::Draw),
                looping: Some(true),
                ..ConfigPatch::default()
            },
            0.0,
        )
        .unwrap();
        assert_eq!(
            c.export_animated(0.0).unwrap().file_name,
            "icon_animated_draw_loop.svg"
        );
        assert_eq!(c.export_static(0.0).unwrap().file_name, "icon_static.svg");
        assert_eq!(
            c.export_raster(0.0).unwrap().file_name,
            "icon_300x300.png"
        );
    }

    #[test]
    fn static_export_after_reset_is_fully_revealed() {
        let mut c = loaded();
        c.tick(SETTLE_DELAY_SECS);
        c.reset();
        let xml = String::from_utf8(c.export_static(1.0).unwrap().bytes).unwrap();
        assert!(!xml.contains("stroke-dashoffset"));
        assert!(!xml.contains("transform"));
        assert!(xml.contains(r#"opacity="1""#));
    }

    #[test]
    fn hidden_fill_promotes_configured_stroke_and_keeps_original() {
        let c = loaded();
        assert_eq!(c.shapes()[1].original_fill, "#ff0000");
        let live = c.live_document(0.0).unwrap();
        let xml = live.to_xml();
        assert!(xml.contains(r#"fill="none""#));
        assert!(xml.contains(r##"stroke="#8b5cf6""##));
    }

    #[test]
    fn copy_source_reports_success_and_expires() {
        let mut c = loaded();
        c.set_clipboard(Box::new(RecordingClipboard(Vec::new())));
        assert!(c.copy_source(1.0));
        assert!(c.copy_feedback(2.5));
        assert!(!c.copy_feedback(3.0));
    }

    #[test]
    fn clipboard_failure_is_swallowed() {
        let mut c = loaded();
        c.set_clipboard(Box::new(BrokenClipboard));
        assert!(!c.copy_source(1.0));
        assert!(!c.copy_feedback(1.5));
    }

    #[test]
    fn structural_config_change_rebuilds_and_idles() {
        let mut c = loaded();
        c.tick(SETTLE_DELAY_SECS);
        assert_eq!(c.phase(), Phase::PreviewPlaying);
        c.set_config(
            &ConfigPatch {
                stroke_color: Some("#ff8800".to_string()),
                ..ConfigPatch::default()
            },
            1.0,
        )
        .unwrap();
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.config().stroke_color, "#ff8800");
    }

    #[test]
    fn speed_change_does_not_interrupt_playback() {
        let mut c = loaded();
        c.play(0.0);
        assert_eq!(c.phase(), Phase::Playing);
        c.set_config(
            &ConfigPatch {
                speed_multiplier: Some(2.0),
                ..ConfigPatch::default()
            },
            0.1,
        )
        .unwrap();
        assert_eq!(c.phase(), Phase::Playing);
    }

    #[test]
    fn invalid_patch_is_rejected_without_side_effects() {
        let mut c = loaded();
        let err = c.set_config(
            &ConfigPatch {
                stroke_width: Some(-3.0),
                ..ConfigPatch::default()
            },
            0.0,
        );
        assert!(err.is_err());
        assert_eq!(c.config().stroke_width, 2.0);
    }

    #[test]
    fn unusable_markup_leaves_controller_empty() {
        let mut c = Controller::new();
        c.load("<<<not markup", "junk.svg", 0.0);
        assert_eq!(c.shape_count(), 0);
        assert!(c.live_document(0.0).is_none());
        assert_eq!(c.phase(), Phase::Idle);
    }
}
