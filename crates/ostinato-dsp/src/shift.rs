//! Pitch shifting by composed stretch + resample.

use crate::error::Result;
use crate::resample::resample;
use crate::stretch::{stretch, StretchParams};

/// Shift a mono waveform by `semitones` without changing its duration.
///
/// Time-stretches by `1 / 2^(n/12)` so the waveform lengthens (for upward
/// shifts) at constant pitch, then speeds it back up by the same factor,
/// which restores the duration while moving the pitch. The first window of
/// the stretched signal is discarded: the vocoder's phase accumulator has no
/// history there and the frames come out incoherent.
pub fn pitch_shift(samples: &[f32], semitones: i32, params: &StretchParams) -> Result<Vec<i16>> {
    let factor = 2.0f64.powf(semitones as f64 / 12.0);
    let stretched = stretch(samples, 1.0 / factor, params)?;
    let body = stretched.get(params.window_size..).unwrap_or(&[]);
    resample(body, factor)
}
