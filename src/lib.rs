//! # Ostinato
//!
//! Recreate a musical performance from a single video clip: every note in an
//! event (MIDI) file becomes a pitch-shifted copy of the source, arranged in
//! time and on screen by track.
//!
//! ## Architecture
//!
//! Umbrella crate over the subsystem crates:
//! - **ostinato-dsp** — resampler, phase-vocoder stretcher, pitch shifter
//! - **ostinato-score** — track/event model, MIDI parsing, score analysis
//! - **ostinato-video** — media collaborator contract + ffmpeg backend
//! - **ostinato-render** — pitch bank, scheduler, bounded compositor,
//!   assembler, pipeline
//!
//! ## Quick Start
//!
//! ```ignore
//! use ostinato::{render, FfmpegLibrary, RenderOptions};
//!
//! let media = FfmpegLibrary::new();
//! let options = RenderOptions::new("dog.mp4", "song.mid", "performance.mp4")
//!     .speed(1.5)
//!     .fadeout(0.2);
//! render(&media, &options)?;
//! ```

/// Re-export of ostinato-dsp for direct access
pub use ostinato_dsp as dsp;
/// Re-export of ostinato-render for direct access
pub use ostinato_render as engine;
/// Re-export of ostinato-score for direct access
pub use ostinato_score as score;
/// Re-export of ostinato-video for direct access
pub use ostinato_video as video;

// The pipeline surface most callers need
pub use ostinato_render::{render, render_with, Error, RenderOptions, Result};

// Collaborator contract and the shipped backend
pub use ostinato_video::{FfmpegLibrary, MediaLibrary};

// Core knobs
pub use ostinato_dsp::StretchParams;
pub use ostinato_render::{BankConfig, PitchBank, ScheduleConfig};
