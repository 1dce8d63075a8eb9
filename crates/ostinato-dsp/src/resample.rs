//! Nearest-index resampling.

use crate::error::{Error, Result};

/// Change the speed of a waveform by `ratio` via nearest-index subsampling.
///
/// Output sample `k` is input sample `round(k * ratio)`; no interpolation is
/// performed. The output holds roughly `len / ratio` samples, so a ratio
/// above 1 shortens the waveform (raising pitch when played at the original
/// rate) and a ratio below 1 lengthens it.
///
/// Deterministic for identical input. Fails with [`Error::NonPositiveRatio`]
/// when `ratio` is zero, negative, or not finite.
pub fn resample<T: Copy>(samples: &[T], ratio: f64) -> Result<Vec<T>> {
    if !(ratio > 0.0) || !ratio.is_finite() {
        return Err(Error::NonPositiveRatio(ratio));
    }

    let mut out = Vec::with_capacity((samples.len() as f64 / ratio) as usize + 1);
    let mut pos = 0.0f64;
    loop {
        let index = pos.round() as usize;
        if index >= samples.len() {
            break;
        }
        out.push(samples[index]);
        pos += ratio;
    }
    Ok(out)
}
