//! The media library contract.

use std::path::Path;

use ostinato_dsp::StereoWave;

use crate::clip::{Margin, ScreenPosition};
use crate::error::Result;

/// Contract for the video/audio codec collaborator.
///
/// Clips are opaque capability-bearing values: every transform returns a new
/// handle and leaves the original usable, so the renderer can derive many
/// clips from one source. Nothing in the renderer inspects encoded bytes.
///
/// Transforms are descriptor-level operations and therefore infallible;
/// anything that touches real media (`open`, `read_audio`, `title`,
/// `composite_to`) can fail.
pub trait MediaLibrary {
    /// Opaque clip handle.
    type Clip: Clone;

    /// Open a media file as a clip.
    fn open(&self, path: &Path) -> Result<Self::Clip>;

    /// Duration of a clip in seconds, after any transforms applied to it.
    fn duration(&self, clip: &Self::Clip) -> f64;

    /// Scale a clip's video by `factor`.
    fn resized(&self, clip: &Self::Clip, factor: f64) -> Self::Clip;

    /// Add a border around a clip.
    fn with_margin(&self, clip: &Self::Clip, margin: Margin) -> Self::Clip;

    /// Replace a clip's audio with the given audio file.
    fn with_audio(&self, clip: &Self::Clip, audio: &Path) -> Self::Clip;

    /// Place a clip at an absolute start time on the composite timeline.
    fn starting_at(&self, clip: &Self::Clip, seconds: f64) -> Self::Clip;

    /// Limit a clip to the given duration.
    fn lasting(&self, clip: &Self::Clip, seconds: f64) -> Self::Clip;

    /// Pin a clip to a canvas position.
    fn positioned(&self, clip: &Self::Clip, position: ScreenPosition) -> Self::Clip;

    /// Fade a clip's tail out over the given length.
    fn faded_out(&self, clip: &Self::Clip, seconds: f64) -> Self::Clip;

    /// Create a rendered-text clip.
    fn title(&self, text: &str) -> Result<Self::Clip>;

    /// Decode a file's audio stream into a stereo waveform.
    fn read_audio(&self, path: &Path) -> Result<StereoWave>;

    /// Compose clips onto one timeline and encode the result to `dest`.
    ///
    /// Must either produce a complete file at `dest` or fail without leaving
    /// one behind.
    fn composite_to(&self, clips: &[Self::Clip], dest: &Path) -> Result<()>;
}
