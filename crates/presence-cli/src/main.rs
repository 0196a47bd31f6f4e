//! `presence` — run the attendance anti-spoof pipelines against image files.
//!
//! Exit codes: 0 verdict accepted, 1 verdict rejected, 2 input error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use presence_core::{CardEngine, Frame, LivenessEngine, NoopDetector};

mod config;

#[derive(Parser)]
#[command(name = "presence", version, about = "Liveness and ID-card anti-spoof diagnostics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check face liveness from two consecutive frames
    Liveness { frame0: PathBuf, frame1: PathBuf },
    /// Check ID-card authenticity from a still frame
    Card { frame: PathBuf },
    /// Dump the raw signal vector for a frame pair, or the still-frame
    /// subset for a single frame
    Signals {
        frame0: PathBuf,
        frame1: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            tracing::error!("{err:#}");
            std::process::exit(2);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = config::Config::from_env();

    match cli.command {
        Command::Liveness { frame0, frame1 } => {
            let f0 = load_frame(&frame0)?;
            let f1 = load_frame(&frame1)?;
            // No cascade engine is wired into the CLI; the decision falls
            // back to motion + depth corroboration.
            let engine = LivenessEngine::new(config.liveness, config.detector, NoopDetector);
            let verdict = engine.check_liveness(&f0, &f1);
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            Ok(if verdict.accepted { 0 } else { 1 })
        }
        Command::Card { frame } => {
            let f = load_frame(&frame)?;
            let engine = CardEngine::new(config.card);
            let verdict = engine.check_card_authenticity(&f);
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            Ok(if verdict.accepted { 0 } else { 1 })
        }
        Command::Signals { frame0, frame1 } => {
            let f0 = load_frame(&frame0)?;
            match frame1 {
                Some(path) => {
                    let f1 = load_frame(&path)?;
                    let signals = presence_core::extract(&f0, &f1)
                        .context("signal extraction failed")?;
                    println!("{}", serde_json::to_string_pretty(&signals)?);
                }
                None => {
                    let signals = presence_core::extract_single(&f0)
                        .context("signal extraction failed")?;
                    println!("{}", serde_json::to_string_pretty(&signals)?);
                }
            }
            Ok(0)
        }
    }
}

/// Decode an image file into an RGB frame (the transport-decoder collaborator
/// of the decision core).
fn load_frame(path: &Path) -> Result<Frame> {
    let img = image::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?
        .to_rgb8();
    let (width, height) = (img.width() as usize, img.height() as usize);
    Frame::from_rgb(width, height, img.into_raw())
        .with_context(|| format!("invalid raster in {}", path.display()))
}
