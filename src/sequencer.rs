//! Playback state machine.
//!
//! One run schedules a timer chain per shape (start, rainbow ticks, trail
//! spawn, completion) on a shared virtual-time queue. Every chain is keyed
//! by the generation that started it; bumping the generation strands every
//! outstanding timer, so a superseded run can never mutate a newer run's
//! state. Completion is a plain monotonic counter and carries no ordering
//! assumption: shapes finish in `delay + duration` order, not document
//! order.

use crate::config::{AnimationConfig, AnimationStyle};
use crate::ease::Ease;
use crate::error::{InkflowError, InkflowResult};
use crate::inventory::Shape;
use crate::style::{self, RAINBOW_RAMP};
use crate::timer::{Generation, TimerQueue};
use crate::visual::{self, Pose, ShapeVisual, TrailGhost};

pub const PREVIEW_SPEED: f64 = 1.5;
pub const PREVIEW_FLOOR_SECS: f64 = 0.6;
pub const PREVIEW_LENGTH_DIVISOR: f64 = 250.0;
pub const PREVIEW_STAGGER_SECS: f64 = 0.2;

pub const PLAY_FLOOR_SECS: f64 = 0.8;
pub const PLAY_LENGTH_DIVISOR: f64 = 200.0;
pub const PLAY_STAGGER_SECS: f64 = 0.3;

/// Settle delay between a document landing and its one-shot preview run.
pub const SETTLE_DELAY_SECS: f64 = 0.5;
/// Lag before the first shape of a run starts animating.
pub const START_LAG_SECS: f64 = 0.1;
/// Hold between the last completion and the phase transition.
pub const COMPLETION_HOLD_SECS: f64 = 0.2;
/// Extra hold before a finished preview falls back to Idle.
pub const PREVIEW_HOLD_SECS: f64 = 0.8;
/// Fixed fade for shapes without a computable length.
pub const FALLBACK_FADE_SECS: f64 = 0.5;
/// Gap between a reset and the replayed run it feeds.
pub const REPLAY_GAP_SECS: f64 = 0.1;

pub const TRAIL_SPAWN_FRACTION: f64 = 0.5;
pub const TRAIL_FADE_SECS: f64 = 2.0;
const RAINBOW_STEPS: usize = RAINBOW_RAMP.len();

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    PreviewPlaying,
    Playing,
    Paused,
    Completed,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct PlaybackState {
    pub phase: Phase,
    pub progress_percent: f64,
    pub loop_count: u32,
    pub completed_shapes: usize,
}

impl PlaybackState {
    fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            progress_percent: 0.0,
            loop_count: 0,
            completed_shapes: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunKind {
    Preview,
    Play,
}

#[derive(Clone, Debug)]
enum TimerEvent {
    StartPreview,
    CompleteShape(usize),
    RainbowTick { index: usize, step: usize },
    SpawnTrail(usize),
    DropTrail,
    FinishHold,
    PreviewSettleBack,
    LoopRest,
    ReplayKick,
}

#[derive(Clone, Copy, Debug)]
struct ShapeSchedule {
    start_at: f64,
    duration: f64,
    fallback: bool,
}

pub struct Sequencer {
    shapes: Vec<Shape>,
    cfg: AnimationConfig,
    state: PlaybackState,
    generation: Generation,
    timers: TimerQueue<TimerEvent>,
    schedule: Vec<Option<ShapeSchedule>>,
    completed: Vec<bool>,
    stroke_overrides: Vec<Option<String>>,
    frozen: Option<Vec<ShapeVisual>>,
    trails: Vec<TrailGhost>,
    run_kind: Option<RunKind>,
}

impl Sequencer {
    pub fn new(shapes: Vec<Shape>, cfg: AnimationConfig) -> Self {
        let n = shapes.len();
        Self {
            shapes,
            cfg,
            state: PlaybackState::idle(),
            generation: 0,
            timers: TimerQueue::new(),
            schedule: vec![None; n],
            completed: vec![false; n],
            stroke_overrides: vec![None; n],
            frozen: None,
            trails: Vec::new(),
            run_kind: None,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn trails(&self) -> &[TrailGhost] {
        &self.trails
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.cfg
    }

    /// Replace the config. A restart invalidates the active run and drops
    /// back to Idle at the new baseline.
    pub fn set_config(&mut self, cfg: AnimationConfig, restart: bool) {
        self.cfg = cfg;
        if restart {
            self.reset();
        }
    }

    /// Queue the one-shot preview run after the settle delay.
    pub fn schedule_preview(&mut self, now: f64) {
        self.invalidate();
        self.clear_run_state();
        self.state = PlaybackState::idle();
        self.timers
            .schedule(now + SETTLE_DELAY_SECS, self.generation, TimerEvent::StartPreview);
    }

    pub fn play(&mut self, now: f64) {
        self.start_run(now, RunKind::Play, false);
    }

    /// Freeze every shape's interpolated visual in place. Only legal while
    /// Playing; the preview run cannot be paused.
    pub fn pause(&mut self, now: f64) -> InkflowResult<()> {
        if self.state.phase != Phase::Playing {
            return Err(InkflowError::sequence("pause is only valid while playing"));
        }
        self.frozen = Some(self.current_visuals(now));
        self.invalidate();
        self.state.phase = Phase::Paused;
        Ok(())
    }

    /// Revert to the baseline pose instantly and drop all bookkeeping.
    pub fn reset(&mut self) {
        self.invalidate();
        self.clear_run_state();
        self.state = PlaybackState::idle();
    }

    pub fn stop(&mut self) {
        self.reset();
    }

    /// Reset, then start a fresh play run after the replay gap.
    pub fn replay(&mut self, now: f64) {
        self.reset();
        self.timers
            .schedule(now + REPLAY_GAP_SECS, self.generation, TimerEvent::ReplayKick);
    }

    /// Pump every timer due at `now`.
    pub fn tick(&mut self, now: f64) {
        while let Some(event) = self.timers.pop_due(now, self.generation) {
            self.handle(event, now);
        }
    }

    /// Fire time of the next live timer, for host wake-up scheduling.
    pub fn next_due(&mut self) -> Option<f64> {
        self.timers.next_due(self.generation)
    }

    /// The computed visual of every shape at `now`: frozen values while
    /// Paused, otherwise interpolated from the active run's schedule.
    pub fn current_visuals(&self, now: f64) -> Vec<ShapeVisual> {
        if let Some(frozen) = &self.frozen {
            return frozen.clone();
        }
        self.shapes
            .iter()
            .map(|shape| self.shape_visual(shape, now))
            .collect()
    }

    fn shape_visual(&self, shape: &Shape, now: f64) -> ShapeVisual {
        let mut v = visual::baseline(shape, &self.cfg);
        let Some(Some(sched)) = self.schedule.get(shape.index) else {
            return v;
        };
        if now < sched.start_at {
            return v;
        }
        let t = ((now - sched.start_at) / sched.duration).clamp(0.0, 1.0);
        let eased = if sched.fallback {
            Ease::InOut.apply(t)
        } else {
            style::spec(self.cfg.style).ease.apply(t)
        };
        let resting = visual::resting(shape, &self.cfg);
        v.pose = Pose::lerp(&v.pose, &resting.pose, eased);
        if !self.completed[shape.index] {
            v.stroke_override = self.stroke_overrides[shape.index].clone();
        }
        v
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.timers.clear();
    }

    fn clear_run_state(&mut self) {
        let n = self.shapes.len();
        self.schedule = vec![None; n];
        self.completed = vec![false; n];
        self.stroke_overrides = vec![None; n];
        self.frozen = None;
        self.trails.clear();
        self.run_kind = None;
    }

    fn start_run(&mut self, now: f64, kind: RunKind, preserve_loops: bool) {
        self.invalidate();
        let loops = self.state.loop_count;
        self.clear_run_state();
        self.run_kind = Some(kind);
        self.state = PlaybackState {
            phase: match kind {
                RunKind::Preview => Phase::PreviewPlaying,
                RunKind::Play => Phase::Playing,
            },
            progress_percent: 0.0,
            loop_count: if preserve_loops { loops } else { 0 },
            completed_shapes: 0,
        };

        if self.shapes.is_empty() {
            self.state.progress_percent = 100.0;
            self.timers.schedule(
                now + COMPLETION_HOLD_SECS,
                self.generation,
                TimerEvent::FinishHold,
            );
            return;
        }

        let (speed, floor, divisor, stagger) = match kind {
            RunKind::Preview => (
                PREVIEW_SPEED,
                PREVIEW_FLOOR_SECS,
                PREVIEW_LENGTH_DIVISOR,
                PREVIEW_STAGGER_SECS,
            ),
            RunKind::Play => (
                self.cfg.speed_multiplier,
                PLAY_FLOOR_SECS,
                PLAY_LENGTH_DIVISOR,
                PLAY_STAGGER_SECS,
            ),
        };

        for index in 0..self.shapes.len() {
            let shape = &self.shapes[index];
            let delay = index as f64 * (stagger / speed);
            let sched = if shape.has_length() {
                ShapeSchedule {
                    start_at: now + START_LAG_SECS + delay,
                    duration: (shape.total_length / divisor).max(floor) / speed,
                    fallback: false,
                }
            } else {
                ShapeSchedule {
                    start_at: now + delay,
                    duration: FALLBACK_FADE_SECS,
                    fallback: true,
                }
            };
            self.schedule[index] = Some(sched);
            self.timers.schedule(
                sched.start_at + sched.duration,
                self.generation,
                TimerEvent::CompleteShape(index),
            );

            if !sched.fallback && self.cfg.style == AnimationStyle::Rainbow {
                for step in 1..RAINBOW_STEPS {
                    self.timers.schedule(
                        sched.start_at + step as f64 * sched.duration / RAINBOW_STEPS as f64,
                        self.generation,
                        TimerEvent::RainbowTick { index, step },
                    );
                }
            }

            if !sched.fallback
                && self.cfg.trail_overlay
                && self.cfg.style == AnimationStyle::Draw
            {
                let spawn_at = sched.start_at + sched.duration * TRAIL_SPAWN_FRACTION;
                self.timers
                    .schedule(spawn_at, self.generation, TimerEvent::SpawnTrail(index));
                self.timers.schedule(
                    spawn_at + TRAIL_FADE_SECS,
                    self.generation,
                    TimerEvent::DropTrail,
                );
            }
        }
    }

    fn handle(&mut self, event: TimerEvent, now: f64) {
        match event {
            TimerEvent::StartPreview => self.start_run(now, RunKind::Preview, false),
            TimerEvent::CompleteShape(index) => self.complete_shape(index, now),
            TimerEvent::RainbowTick { index, step } => {
                if !self.completed[index] {
                    self.stroke_overrides[index] =
                        Some(RAINBOW_RAMP[(step - 1) % RAINBOW_STEPS].to_string());
                }
            }
            TimerEvent::SpawnTrail(index) => {
                self.trails.push(TrailGhost {
                    shape_index: index,
                    expires_at: now + TRAIL_FADE_SECS,
                });
            }
            TimerEvent::DropTrail => {
                self.trails.retain(|t| t.expires_at > now);
            }
            TimerEvent::FinishHold => self.finish_run(now),
            TimerEvent::PreviewSettleBack => {
                self.clear_run_state();
                self.state = PlaybackState::idle();
            }
            TimerEvent::LoopRest => {
                // Re-baseline during the rest gap; phase stays Completed so
                // an observer never sees Idle mid-loop.
                let state = self.state.clone();
                self.clear_run_state();
                self.state = PlaybackState {
                    progress_percent: 0.0,
                    completed_shapes: 0,
                    ..state
                };
                self.timers
                    .schedule(now + REPLAY_GAP_SECS, self.generation, TimerEvent::ReplayKick);
            }
            TimerEvent::ReplayKick => self.start_run(now, RunKind::Play, true),
        }
    }

    /// Order-independent completion bookkeeping: a monotonic counter that
    /// tolerates arbitrary arrival order and never double-counts.
    fn complete_shape(&mut self, index: usize, now: f64) {
        if self.completed[index] {
            return;
        }
        self.completed[index] = true;
        self.stroke_overrides[index] = None;
        self.state.completed_shapes += 1;
        self.state.progress_percent =
            100.0 * self.state.completed_shapes as f64 / self.shapes.len() as f64;
        if self.state.completed_shapes == self.shapes.len() {
            self.timers.schedule(
                now + COMPLETION_HOLD_SECS,
                self.generation,
                TimerEvent::FinishHold,
            );
        }
    }

    fn finish_run(&mut self, now: f64) {
        self.state.phase = Phase::Completed;
        match self.run_kind {
            Some(RunKind::Preview) => {
                self.timers.schedule(
                    now + PREVIEW_HOLD_SECS,
                    self.generation,
                    TimerEvent::PreviewSettleBack,
                );
            }
            Some(RunKind::Play) if self.cfg.looping => {
                self.state.loop_count += 1;
                tracing::debug!(loop_count = self.state.loop_count, "loop completed");
                self.timers.schedule(
                    now + self.cfg.rest_seconds,
                    self.generation,
                    TimerEvent::LoopRest,
                );
            }
            _ => {}
        }
    }
}
