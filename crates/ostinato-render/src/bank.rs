//! Stereo pitch bank.
//!
//! One pitch-shifted stereo copy of the source audio per semitone offset the
//! score spans, written as WAV files in a cache directory keyed by source
//! name and offset. Offsets already on disk are reused across runs unless a
//! rebuild is forced; an unreadable cache file costs only its own offset,
//! not the whole bank.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use ostinato_dsp::{pitch_shift, StereoWave, StretchParams};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Scale from the stretcher's i16 output back into float samples.
const I16_SCALE: f32 = 1.0 / 32768.0;

/// Seam for the per-channel shift algorithm.
///
/// Production code uses [`VocoderShifter`]; tests substitute doubles to count
/// or fake invocations.
pub trait PitchShifter: Sync {
    /// Shift a mono waveform by the given semitone count, preserving
    /// duration.
    fn shift(&self, samples: &[f32], semitones: i32) -> ostinato_dsp::Result<Vec<i16>>;
}

/// The phase-vocoder shifter from `ostinato-dsp`.
#[derive(Debug, Clone, Default)]
pub struct VocoderShifter {
    params: StretchParams,
}

impl VocoderShifter {
    pub fn new(params: StretchParams) -> Self {
        Self { params }
    }
}

impl PitchShifter for VocoderShifter {
    fn shift(&self, samples: &[f32], semitones: i32) -> ostinato_dsp::Result<Vec<i16>> {
        pitch_shift(samples, semitones, &self.params)
    }
}

/// Where and how the bank caches its clips.
#[derive(Debug, Clone)]
pub struct BankConfig {
    /// Cache directory; created when missing.
    pub cache_dir: PathBuf,

    /// Recompute every offset even when a cached file exists.
    pub rebuild: bool,
}

impl BankConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            rebuild: false,
        }
    }

    pub fn rebuild(mut self, rebuild: bool) -> Self {
        self.rebuild = rebuild;
        self
    }
}

impl Default for BankConfig {
    fn default() -> Self {
        Self::new("pitches")
    }
}

/// One cached clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchBankEntry {
    /// Semitone offset from the score's center note.
    pub offset: i32,

    /// Cached stereo WAV holding the shifted audio.
    pub path: PathBuf,
}

/// The full set of shifted clips for one source, ordered by offset.
#[derive(Debug, Clone)]
pub struct PitchBank {
    entries: Vec<PitchBankEntry>,
}

impl PitchBank {
    /// Build (or reload from cache) the clip for every offset in `offsets`.
    ///
    /// Offsets are independent, so they are computed in parallel; each writes
    /// its own file and the bank is complete when this returns.
    pub fn build(
        wave: &StereoWave,
        source: &Path,
        offsets: RangeInclusive<i32>,
        config: &BankConfig,
        shifter: &impl PitchShifter,
    ) -> Result<Self> {
        std::fs::create_dir_all(&config.cache_dir)?;
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "source".into());

        let offsets: Vec<i32> = offsets.collect();
        info!(
            offsets = offsets.len(),
            cache_dir = %config.cache_dir.display(),
            "populating pitch bank"
        );

        let entries = offsets
            .into_par_iter()
            .map(|offset| {
                let path = config.cache_dir.join(format!("{stem}_{offset}.wav"));
                build_offset(wave, offset, &path, config.rebuild, shifter)?;
                Ok(PitchBankEntry { offset, path })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Number of offsets in the bank.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bank holds no offsets.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The offsets covered, in ascending order.
    pub fn offsets(&self) -> impl Iterator<Item = i32> + '_ {
        self.entries.iter().map(|e| e.offset)
    }

    /// Entry at `index` semitones above the bank's lowest offset, clamped
    /// into range.
    pub fn entry(&self, index: usize) -> &PitchBankEntry {
        &self.entries[index.min(self.entries.len() - 1)]
    }
}

/// Produce one offset's cache file unless a readable one already exists.
fn build_offset(
    wave: &StereoWave,
    offset: i32,
    path: &Path,
    rebuild: bool,
    shifter: &impl PitchShifter,
) -> Result<()> {
    if !rebuild && path.exists() {
        // A cached file only counts if it still opens; anything else is
        // regenerated in place.
        match hound::WavReader::open(path) {
            Ok(_) => {
                debug!(offset, path = %path.display(), "reusing cached pitch");
                return Ok(());
            }
            Err(err) => {
                warn!(offset, path = %path.display(), %err, "cached pitch unreadable, regenerating");
            }
        }
    }

    debug!(offset, "transposing");
    let left = shifter.shift(wave.left(), offset)?;
    let right = shifter.shift(wave.right(), offset)?;
    write_stereo_wav(path, &left, &right, wave.sample_rate())?;
    Ok(())
}

/// Write interleaved float WAV from the shifter's integer output.
fn write_stereo_wav(path: &Path, left: &[i16], right: &[i16], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for (&l, &r) in left.iter().zip(right.iter()) {
        writer.write_sample(l as f32 * I16_SCALE)?;
        writer.write_sample(r as f32 * I16_SCALE)?;
    }
    writer.finalize()?;
    Ok(())
}
