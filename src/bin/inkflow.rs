use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use inkflow::{AnimationStyle, ConfigPatch, Controller, DisplayOptions};
use inkflow::sequencer::{
    FALLBACK_FADE_SECS, PLAY_FLOOR_SECS, PLAY_LENGTH_DIVISOR, PLAY_STAGGER_SECS,
};

#[derive(Parser, Debug)]
#[command(name = "inkflow", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the shape inventory and the play-run timing plan.
    Inspect(InspectArgs),
    /// Export an animated SVG with embedded keyframes.
    ExportAnimated(ExportAnimatedArgs),
    /// Export a static, fully-revealed SVG.
    ExportStatic(ExportStaticArgs),
    /// Export a PNG rendered at 2x the display size.
    ExportPng(ExportPngArgs),
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input SVG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Speed multiplier used for the timing plan.
    #[arg(long, default_value_t = 1.0)]
    speed: f64,
}

#[derive(Parser, Debug)]
struct ExportAnimatedArgs {
    /// Input SVG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory (filename is derived from the input).
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Animation style.
    #[arg(long, default_value = "draw")]
    style: String,

    /// Speed multiplier.
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Stroke color.
    #[arg(long, default_value = "#8b5cf6")]
    color: String,

    /// Loop forever with a rest between cycles.
    #[arg(long)]
    looping: bool,

    /// Rest between loop cycles, seconds.
    #[arg(long, default_value_t = 1.0)]
    rest: f64,
}

#[derive(Parser, Debug)]
struct ExportStaticArgs {
    /// Input SVG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory (filename is derived from the input).
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportPngArgs {
    /// Input SVG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory (filename is derived from the input).
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Display size in pixels (the PNG renders at 2x).
    #[arg(long, default_value_t = 300)]
    size: u32,

    /// Render on the light background instead of the dark one.
    #[arg(long)]
    light: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::ExportAnimated(args) => cmd_export_animated(args),
        Command::ExportStatic(args) => cmd_export_static(args),
        Command::ExportPng(args) => cmd_export_png(args),
    }
}

fn load_controller(in_path: &Path) -> anyhow::Result<Controller> {
    let content = std::fs::read_to_string(in_path)
        .with_context(|| format!("read input '{}'", in_path.display()))?;
    let name = in_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.svg".to_string());
    let mut controller = Controller::new();
    controller.load(&content, &name, 0.0);
    anyhow::ensure!(
        controller.live_document(0.0).is_some(),
        "input did not survive sanitization as a parseable document"
    );
    Ok(controller)
}

fn write_artifact(out_dir: &Path, artifact: &inkflow::Artifact) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir '{}'", out_dir.display()))?;
    let out = out_dir.join(&artifact.file_name);
    std::fs::write(&out, &artifact.bytes)
        .with_context(|| format!("write '{}'", out.display()))?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn parse_style(raw: &str) -> anyhow::Result<AnimationStyle> {
    AnimationStyle::from_name(raw)
        .ok_or_else(|| anyhow::anyhow!("unknown style '{raw}' (expected one of draw, fade, scale, bounce, wave, spiral, pulse, elastic, rainbow)"))
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let mut controller = load_controller(&args.in_path)?;
    controller
        .set_config(
            &ConfigPatch {
                speed_multiplier: Some(args.speed),
                ..ConfigPatch::default()
            },
            0.0,
        )
        .map_err(anyhow::Error::from)?;

    println!("{}: {} shapes", controller.source_name(), controller.shape_count());
    for shape in controller.shapes() {
        let delay = shape.index as f64 * (PLAY_STAGGER_SECS / args.speed);
        let (duration, note) = if shape.has_length() {
            (
                (shape.total_length / PLAY_LENGTH_DIVISOR).max(PLAY_FLOOR_SECS) / args.speed,
                "",
            )
        } else {
            (FALLBACK_FADE_SECS, " (fallback fade)")
        };
        println!(
            "  #{:<3} {:<9} length {:>9.2}  delay {:>6.2}s  duration {:>6.2}s{}",
            shape.index,
            format!("{:?}", shape.kind).to_lowercase(),
            shape.total_length,
            delay,
            duration,
            note,
        );
    }
    Ok(())
}

fn cmd_export_animated(args: ExportAnimatedArgs) -> anyhow::Result<()> {
    let mut controller = load_controller(&args.in_path)?;
    controller
        .set_config(
            &ConfigPatch {
                style: Some(parse_style(&args.style)?),
                speed_multiplier: Some(args.speed),
                stroke_color: Some(args.color),
                looping: Some(args.looping),
                rest_seconds: Some(args.rest),
                ..ConfigPatch::default()
            },
            0.0,
        )
        .map_err(anyhow::Error::from)?;
    let artifact = controller
        .export_animated(0.0)
        .context("nothing to export")?;
    write_artifact(&args.out_dir, &artifact)
}

fn cmd_export_static(args: ExportStaticArgs) -> anyhow::Result<()> {
    let controller = load_controller(&args.in_path)?;
    let artifact = controller
        .export_static(0.0)
        .context("nothing to export")?;
    write_artifact(&args.out_dir, &artifact)
}

fn cmd_export_png(args: ExportPngArgs) -> anyhow::Result<()> {
    let mut controller = load_controller(&args.in_path)?;
    controller
        .set_display(DisplayOptions {
            size_px: args.size,
            dark_mode: !args.light,
        })
        .map_err(anyhow::Error::from)?;
    let artifact = controller
        .export_raster(0.0)
        .context("nothing to export")?;
    write_artifact(&args.out_dir, &artifact)
}
