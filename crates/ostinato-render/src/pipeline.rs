//! End-to-end pipeline.
//!
//! `parse → analyze → pitch bank → schedule → composite → assemble`, wired
//! in one place. Everything upstream of the media backend is deterministic;
//! the pitch bank is the only stage that fans out across cores.

use std::path::PathBuf;

use ostinato_score::{analyze, Score};
use ostinato_video::{Margin, MediaLibrary};
use tracing::info;

use crate::assemble::assemble;
use crate::bank::{BankConfig, PitchBank, PitchShifter, VocoderShifter};
use crate::compose::Compositor;
use crate::error::{Error, Result};
use crate::schedule::{ScheduleConfig, Scheduler, LEAD_SECONDS};

/// Scale of the non-main-track visual variant.
const SMALL_SCALE: f64 = 0.3;

/// Text on the closing title card.
const TITLE_TEXT: &str = "ostinato";

/// Everything one render needs.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Source video whose image and audio get recreated per note.
    pub source: PathBuf,

    /// Note-timing (MIDI) file.
    pub events: PathBuf,

    /// Destination video path.
    pub dest: PathBuf,

    /// Multiplier from native ticks to schedule milliseconds.
    pub speed: f64,

    /// Fade-out appended to every note clip, in seconds.
    pub fadeout: f64,

    /// Recompute cached pitches even when present.
    pub rebuild: bool,

    /// Ceiling on simultaneously held in-memory clips.
    pub max_clips: usize,

    /// Directory for cached pitch-shifted audio.
    pub cache_dir: PathBuf,
}

impl RenderOptions {
    pub fn new(
        source: impl Into<PathBuf>,
        events: impl Into<PathBuf>,
        dest: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            events: events.into(),
            dest: dest.into(),
            speed: 1.5,
            fadeout: 0.2,
            rebuild: false,
            max_clips: 1000,
            cache_dir: PathBuf::from("pitches"),
        }
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn fadeout(mut self, fadeout: f64) -> Self {
        self.fadeout = fadeout;
        self
    }

    pub fn rebuild(mut self, rebuild: bool) -> Self {
        self.rebuild = rebuild;
        self
    }

    pub fn max_clips(mut self, max_clips: usize) -> Self {
        self.max_clips = max_clips;
        self
    }

    pub fn cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Reject unusable parameters before any I/O happens.
    fn validate(&self) -> Result<()> {
        if !(self.speed > 0.0) || !self.speed.is_finite() {
            return Err(Error::InvalidOptions(format!(
                "speed must be positive, got {}",
                self.speed
            )));
        }
        if !(self.fadeout >= 0.0) || !self.fadeout.is_finite() {
            return Err(Error::InvalidOptions(format!(
                "fadeout must be non-negative, got {}",
                self.fadeout
            )));
        }
        if self.max_clips == 0 {
            return Err(Error::InvalidOptions("max-clips must be at least 1".into()));
        }
        Ok(())
    }
}

/// Render with the production phase-vocoder shifter.
pub fn render<M: MediaLibrary>(media: &M, options: &RenderOptions) -> Result<()> {
    render_with(media, &VocoderShifter::default(), options)
}

/// Render with a caller-supplied shift algorithm.
pub fn render_with<M: MediaLibrary>(
    media: &M,
    shifter: &impl PitchShifter,
    options: &RenderOptions,
) -> Result<()> {
    options.validate()?;

    let mut score = Score::load(&options.events)?;
    let summary = analyze(&score)?;
    info!(
        main_track = summary.main_track,
        name = score.tracks[summary.main_track].display_name(),
        notes = summary.counts.iter().sum::<usize>(),
        lowest = summary.lowest,
        highest = summary.highest,
        center = summary.center(),
        "analyzed event file"
    );
    score.promote_main(summary.main_track);

    let wave = media.read_audio(&options.source)?;
    let bank_config = BankConfig::new(&options.cache_dir).rebuild(options.rebuild);
    let bank = PitchBank::build(
        &wave,
        &options.source,
        summary.offsets(),
        &bank_config,
        shifter,
    )?;

    let video = media.open(&options.source)?;
    let small = {
        let scaled = media.resized(&video, SMALL_SCALE);
        let bordered = media.with_margin(&scaled, Margin::solid(2, [255, 255, 255]));
        media.with_margin(&bordered, Margin::transparent(8))
    };

    let mut compositor = Compositor::new(media, &options.dest, options.max_clips);
    // Lead clip: pins the canvas size and fills the reserved warm-up second.
    compositor.push(media.lasting(&video, LEAD_SECONDS));

    let config = ScheduleConfig {
        speed: options.speed,
        fadeout: options.fadeout,
    };
    let mut scheduler = Scheduler::new(media, &bank, config, summary.lowest, video, small);
    for (index, track) in score.tracks.iter().enumerate() {
        info!(
            track = index,
            name = track.display_name(),
            notes = track.note_on_count(),
            "scheduling track"
        );
        scheduler.schedule_track(&mut compositor, track, index == 0)?;
    }

    assemble(
        media,
        compositor,
        scheduler.end_watermark(),
        &options.dest,
        TITLE_TEXT,
    )
}
