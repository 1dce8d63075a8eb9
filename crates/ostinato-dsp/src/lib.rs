//! Offline pitch and time manipulation of sampled waveforms.
//!
//! Provides the numeric core for recreating a performance from one source
//! sound: a nearest-index resampler, a phase-vocoder time-stretcher, and the
//! pitch shifter composed from the two.
//!
//! # Example
//!
//! ```ignore
//! use ostinato_dsp::{pitch_shift, StretchParams};
//!
//! // Shift a mono waveform up a fifth without changing its duration.
//! let shifted = pitch_shift(&samples, 7, &StretchParams::default())?;
//! ```
//!
//! All operations are batch transforms over full buffers; nothing here is
//! real-time safe and nothing needs to be.

// Error types
pub mod error;
pub use error::{Error, Result};

mod resample;
mod shift;
mod stretch;
mod wave;

pub use resample::resample;
pub use shift::pitch_shift;
pub use stretch::{stretch, StretchParams};
pub use wave::StereoWave;
