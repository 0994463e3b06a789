//! Inkflow prepares an uploaded SVG for a stroke-drawing animation, drives
//! a timer-based playback state machine over its shapes, and exports the
//! result as an animated SVG, a static SVG, or a rasterized PNG.
//!
//! The public API is controller-oriented:
//!
//! - [`Controller::load`] a document (sanitized, inventoried, previewed)
//! - drive playback with `play`/`pause`/`reset`/`replay` and [`Controller::tick`]
//! - pull [`Artifact`] values from the export operations
#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod dom;
pub mod ease;
pub mod error;
pub mod export;
pub mod geometry;
pub mod intake;
pub mod inventory;
pub mod raster;
pub mod sanitize;
pub mod sequencer;
pub mod style;
pub mod timer;
pub mod visual;

pub use config::{AnimationConfig, AnimationStyle, ConfigPatch, DisplayOptions};
pub use controller::{ClipboardSink, Controller};
pub use dom::Document;
pub use ease::Ease;
pub use error::{InkflowError, InkflowResult};
pub use export::Artifact;
pub use intake::IntakeNotice;
pub use inventory::{Shape, ShapeKind};
pub use sequencer::{Phase, PlaybackState, Sequencer};
