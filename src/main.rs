//! Command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use ostinato::{render, FfmpegLibrary, RenderOptions};

/// Recreate a musical performance by pitch-shifting and arranging copies of
/// a source video.
#[derive(Parser, Debug)]
#[command(name = "ostinato", version, about)]
struct Args {
    /// Source video file
    input: PathBuf,

    /// Note-timing (MIDI) file
    events: PathBuf,

    /// Destination video file
    output: PathBuf,

    /// Speed factor applied to event timing
    #[arg(short, long, default_value_t = 1.5)]
    speed: f64,

    /// Fade-out time appended to every note clip, in seconds
    #[arg(long, default_value_t = 0.2)]
    fadeout: f64,

    /// Recompute cached pitch-shifted audio even when present
    #[arg(short, long)]
    rebuild: bool,

    /// Maximum number of clips held in memory
    #[arg(short, long, default_value_t = 1000)]
    max_clips: usize,

    /// Directory for cached pitch-shifted audio
    #[arg(long, default_value = "pitches")]
    cache_dir: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let options = RenderOptions::new(args.input, args.events, args.output)
        .speed(args.speed)
        .fadeout(args.fadeout)
        .rebuild(args.rebuild)
        .max_clips(args.max_clips)
        .cache_dir(args.cache_dir);

    match render(&FfmpegLibrary::new(), &options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
