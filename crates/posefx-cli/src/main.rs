//! posefx CLI — apply pose-driven effects to images from the command line.
//!
//! Pose results come from an upstream estimator as a JSON list of
//! detections, each `{"bbox": [x1, y1, x2, y2], "keypoints":
//! [{"x": .., "y": .., "score": ..}, ..]}` with keypoints in the detector's
//! own body-part order. Keypoint-index flags default to the COCO-17 schema.

use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use posefx::{
    apply_bugeye_effect, apply_firecracker_effect, apply_hat_effect, apply_sunglasses_effect,
    coco, Detection, DEFAULT_KPT_THR,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "posefx")]
#[command(about = "Composite pose-driven effects (bug-eye, sunglasses, hat, firecracker) onto images")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bug-eye lens distortion anchored at the eyes.
    Bugeye(BugeyeArgs),

    /// Sunglasses overlay spanning the eyes (white-background asset).
    Sunglasses(EyeOverlayArgs),

    /// Hat overlay above the eye line (asset must carry an alpha channel).
    Hat(EyeOverlayArgs),

    /// Firecracker overlay hanging from each wrist (white-background asset).
    Firecracker(WristOverlayArgs),
}

#[derive(Debug, Clone, Args)]
struct IoArgs {
    /// Path to the scene image.
    #[arg(long)]
    image: PathBuf,

    /// Path to pose results (JSON list of detections).
    #[arg(long)]
    poses: PathBuf,

    /// Path to write the composited image.
    #[arg(long)]
    out: PathBuf,

    /// Keypoint confidence threshold; detections below it are skipped.
    #[arg(long, default_value_t = DEFAULT_KPT_THR)]
    kpt_thr: f32,
}

#[derive(Debug, Clone, Args)]
struct EyeArgs {
    /// Keypoint index of the left eye.
    #[arg(long, default_value_t = coco::LEFT_EYE)]
    left_eye: usize,

    /// Keypoint index of the right eye.
    #[arg(long, default_value_t = coco::RIGHT_EYE)]
    right_eye: usize,
}

#[derive(Debug, Clone, Args)]
struct BugeyeArgs {
    #[command(flatten)]
    io: IoArgs,

    #[command(flatten)]
    eyes: EyeArgs,
}

#[derive(Debug, Clone, Args)]
struct EyeOverlayArgs {
    #[command(flatten)]
    io: IoArgs,

    #[command(flatten)]
    eyes: EyeArgs,

    /// Path to the overlay asset image.
    #[arg(long)]
    asset: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct WristOverlayArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Path to the overlay asset image.
    #[arg(long)]
    asset: PathBuf,

    /// Keypoint index of the left wrist.
    #[arg(long, default_value_t = coco::LEFT_WRIST)]
    left_wrist: usize,

    /// Keypoint index of the right wrist.
    #[arg(long, default_value_t = coco::RIGHT_WRIST)]
    right_wrist: usize,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    match Cli::parse().command {
        Commands::Bugeye(args) => {
            let scene = image::open(&args.io.image)?.to_rgb8();
            let poses = load_poses(&args.io.poses)?;
            let out = apply_bugeye_effect(
                &scene,
                &poses,
                args.eyes.left_eye,
                args.eyes.right_eye,
                args.io.kpt_thr,
            )?;
            out.save(&args.io.out)?;
        }
        Commands::Sunglasses(args) => {
            let scene = image::open(&args.io.image)?.to_rgb8();
            let poses = load_poses(&args.io.poses)?;
            let asset = image::open(&args.asset)?.to_rgb8();
            let out = apply_sunglasses_effect(
                &scene,
                &poses,
                &asset,
                args.eyes.left_eye,
                args.eyes.right_eye,
                args.io.kpt_thr,
            )?;
            out.save(&args.io.out)?;
        }
        Commands::Hat(args) => {
            let scene = image::open(&args.io.image)?.to_rgb8();
            let poses = load_poses(&args.io.poses)?;
            let asset = image::open(&args.asset)?.to_rgba8();
            let out = apply_hat_effect(
                &scene,
                &poses,
                &asset,
                args.eyes.left_eye,
                args.eyes.right_eye,
                args.io.kpt_thr,
            )?;
            out.save(&args.io.out)?;
        }
        Commands::Firecracker(args) => {
            let scene = image::open(&args.io.image)?.to_rgb8();
            let poses = load_poses(&args.io.poses)?;
            let asset = image::open(&args.asset)?.to_rgb8();
            let out = apply_firecracker_effect(
                &scene,
                &poses,
                &asset,
                args.left_wrist,
                args.right_wrist,
                args.io.kpt_thr,
            )?;
            out.save(&args.io.out)?;
        }
    }
    Ok(())
}

fn load_poses(path: &Path) -> CliResult<Vec<Detection>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
