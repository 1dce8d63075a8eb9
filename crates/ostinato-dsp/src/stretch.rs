//! Phase-vocoder time-stretching.
//!
//! Stretches a waveform in time without changing its pitch by sliding a pair
//! of overlapping analysis windows across the input, correcting the phase of
//! each spectrum against the accumulated phase of the previous frames, and
//! overlap-adding the resynthesized frames at the time-scaled position. The
//! phase correction is what keeps overlapping frames coherent; without it the
//! output smears into the familiar "phasy" artifact of naive frame
//! concatenation.

use std::f64::consts::TAU;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::{Error, Result};

/// Peak amplitude the stretched output is normalized to before quantization.
///
/// Leaves 12 dB of headroom below the i16 full scale so that overlapping
/// clips mixed downstream do not clip.
const NORMALIZED_PEAK: f32 = (1 << 12) as f32;

/// Analysis window configuration for [`stretch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StretchParams {
    /// Analysis window length in samples. Must be a power of two.
    pub window_size: usize,

    /// Hop between successive analysis windows. Must divide the window size.
    pub hop: usize,
}

impl StretchParams {
    /// Default window length (2^13 samples, ~186 ms at 44.1 kHz).
    pub const DEFAULT_WINDOW: usize = 8192;
    /// Default hop (2^11 samples, 75% overlap).
    pub const DEFAULT_HOP: usize = 2048;

    /// Create parameters with the default window/hop.
    pub fn new() -> Self {
        Self {
            window_size: Self::DEFAULT_WINDOW,
            hop: Self::DEFAULT_HOP,
        }
    }

    pub fn window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn hop(mut self, hop: usize) -> Self {
        self.hop = hop;
        self
    }

    /// Validate the window/hop combination.
    pub fn validate(&self) -> Result<()> {
        if !self.window_size.is_power_of_two() {
            return Err(Error::WindowNotPowerOfTwo(self.window_size));
        }
        if self.hop == 0 || self.hop >= self.window_size || self.window_size % self.hop != 0 {
            return Err(Error::InvalidHop {
                hop: self.hop,
                window: self.window_size,
            });
        }
        Ok(())
    }
}

impl Default for StretchParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Time-stretch a mono waveform by `1 / ratio` while preserving pitch.
///
/// A ratio above 1 shortens the output, a ratio below 1 lengthens it; the
/// output holds roughly `len / ratio` samples plus one window of tail. The
/// result is peak-normalized and quantized to `i16`.
///
/// Fails with an invalid-parameter error for a non-positive ratio or a
/// malformed window/hop combination; an all-silent input produces silence.
pub fn stretch(samples: &[f32], ratio: f64, params: &StretchParams) -> Result<Vec<i16>> {
    params.validate()?;
    if !(ratio > 0.0) || !ratio.is_finite() {
        return Err(Error::NonPositiveRatio(ratio));
    }

    let window = params.window_size;
    let hop = params.hop;

    // Sized up front so every overlap-add below lands in bounds.
    let mut accum = vec![0.0f32; (samples.len() as f64 / ratio) as usize + window];

    let hann = hann_window(window);
    let mut phase = vec![0.0f64; window];

    let mut planner = FftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(window);
    let inverse = planner.plan_fft_inverse(window);

    let mut early = vec![Complex::new(0.0f32, 0.0); window];
    let mut late = vec![Complex::new(0.0f32, 0.0); window];

    let step = hop as f64 * ratio;
    let mut pos = 0.0f64;
    let limit = samples.len().saturating_sub(window + hop);

    while (pos as usize) < limit {
        let i = pos as usize;

        // Two analysis frames offset by one hop.
        spectrum(&samples[i..i + window], &hann, forward.as_ref(), &mut early);
        spectrum(
            &samples[i + hop..i + window + hop],
            &hann,
            forward.as_ref(),
            &mut late,
        );

        // Accumulate the wrapped angular difference between the frames and
        // rebuild the later frame from its magnitudes at the corrected phase.
        for k in 0..window {
            let diff = (late[k].arg() - early[k].arg()) as f64;
            phase[k] = (phase[k] + diff).rem_euclid(TAU);
            late[k] = Complex::from_polar(late[k].norm(), phase[k] as f32);
        }

        inverse.process(&mut late);

        let out_at = (pos / ratio) as usize;
        let scale = 1.0 / window as f32;
        for k in 0..window {
            accum[out_at + k] += hann[k] * late[k].re * scale;
        }

        pos += step;
    }

    Ok(quantize(&accum))
}

/// Hann window of the given length.
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (TAU as f32 * i as f32 / size as f32).cos()))
        .collect()
}

/// Windowed forward FFT of one analysis frame into `out`.
fn spectrum(frame: &[f32], hann: &[f32], fft: &dyn Fft<f32>, out: &mut [Complex<f32>]) {
    for (o, (&s, &w)) in out.iter_mut().zip(frame.iter().zip(hann.iter())) {
        *o = Complex::new(s * w, 0.0);
    }
    fft.process(out);
}

/// Normalize to [`NORMALIZED_PEAK`] and quantize to i16.
fn quantize(accum: &[f32]) -> Vec<i16> {
    let peak = accum.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak <= 0.0 {
        return vec![0; accum.len()];
    }
    let gain = NORMALIZED_PEAK / peak;
    accum.iter().map(|&s| (s * gain) as i16).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (TAU as f32 * freq * i as f32 / sample_rate).sin() * 0.5)
            .collect()
    }

    fn small_params() -> StretchParams {
        StretchParams::new().window_size(256).hop(64)
    }

    #[test]
    fn test_params_validation() {
        assert!(StretchParams::new().validate().is_ok());
        assert!(matches!(
            StretchParams::new().window_size(1000).validate(),
            Err(Error::WindowNotPowerOfTwo(1000))
        ));
        assert!(matches!(
            StretchParams::new().window_size(256).hop(300).validate(),
            Err(Error::InvalidHop { .. })
        ));
        assert!(matches!(
            StretchParams::new().window_size(256).hop(96).validate(),
            Err(Error::InvalidHop { .. })
        ));
        assert!(matches!(
            StretchParams::new().hop(0).validate(),
            Err(Error::InvalidHop { .. })
        ));
    }

    #[test]
    fn test_invalid_ratio() {
        let input = sine(440.0, 44100.0, 1024);
        assert!(matches!(
            stretch(&input, 0.0, &small_params()),
            Err(Error::NonPositiveRatio(_))
        ));
        assert!(matches!(
            stretch(&input, -2.0, &small_params()),
            Err(Error::NonPositiveRatio(_))
        ));
    }

    #[test]
    fn test_output_length() {
        let params = small_params();
        let input = sine(440.0, 44100.0, 8192);

        let halved = stretch(&input, 2.0, &params).unwrap();
        assert_eq!(halved.len(), input.len() / 2 + params.window_size);

        let doubled = stretch(&input, 0.5, &params).unwrap();
        assert_eq!(doubled.len(), input.len() * 2 + params.window_size);
    }

    #[test]
    fn test_peak_normalization() {
        let params = small_params();
        // Quiet input still normalizes to the fixed peak.
        let input: Vec<f32> = sine(440.0, 44100.0, 8192).iter().map(|s| s * 0.01).collect();
        let out = stretch(&input, 1.0, &params).unwrap();
        let peak = out.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!(peak >= 4095 && peak <= 4096, "peak was {peak}");
    }

    #[test]
    fn test_silence_stays_silent() {
        let params = small_params();
        let out = stretch(&vec![0.0; 4096], 1.5, &params).unwrap();
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_input_shorter_than_window() {
        let params = small_params();
        let out = stretch(&[0.1; 100], 1.0, &params).unwrap();
        // No analysis frame fits; the pre-sized buffer comes back silent.
        assert_eq!(out.len(), 100 + params.window_size);
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_preserves_dominant_frequency() {
        let params = small_params();
        let sample_rate = 8192.0;
        let input = sine(256.0, sample_rate, 16384);

        let out = stretch(&input, 2.0, &params).unwrap();
        let body = &out[params.window_size..out.len() - params.window_size];
        let freq = dominant_frequency(body, sample_rate);
        assert!(
            (freq - 256.0).abs() < 16.0,
            "expected ~256 Hz after stretch, got {freq}"
        );
    }

    /// Estimate the dominant frequency from zero crossings.
    fn dominant_frequency(samples: &[i16], sample_rate: f32) -> f32 {
        let crossings = samples
            .windows(2)
            .filter(|w| (w[0] < 0) != (w[1] < 0))
            .count();
        crossings as f32 * sample_rate / (2.0 * samples.len() as f32)
    }
}
