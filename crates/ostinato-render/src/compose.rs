//! Bounded clip arena.
//!
//! The compositor owns every live clip. When the arena reaches its ceiling,
//! all clips before the earliest still-open note are merged into one on-disk
//! segment, reloaded as a single placeholder clip, and every open note's
//! recorded index is rebased past the collapse. Memory use is therefore
//! bounded by the ceiling no matter how many notes a score holds.

use std::path::{Path, PathBuf};

use ostinato_video::MediaLibrary;
use tracing::{debug, info};

use crate::error::Result;
use crate::schedule::OpenNotes;

/// Accumulates clips and flushes closed prefixes to disk.
pub struct Compositor<'a, M: MediaLibrary> {
    media: &'a M,
    clips: Vec<M::Clip>,
    ceiling: usize,
    dest: PathBuf,
    segments: Vec<PathBuf>,
}

impl<'a, M: MediaLibrary> Compositor<'a, M> {
    /// Arena flushing to segments derived from `dest`, holding at most
    /// `ceiling` clips in memory.
    pub fn new(media: &'a M, dest: &Path, ceiling: usize) -> Self {
        Self {
            media,
            clips: Vec::new(),
            ceiling: ceiling.max(1),
            dest: dest.to_path_buf(),
            segments: Vec::new(),
        }
    }

    /// Add a clip, returning its arena index.
    pub fn push(&mut self, clip: M::Clip) -> usize {
        self.clips.push(clip);
        self.clips.len() - 1
    }

    /// Fix a clip's duration and fade-out; the clip is final afterwards.
    pub fn close(&mut self, index: usize, duration: f64, fadeout: f64) {
        let closed = self.media.lasting(&self.clips[index], duration);
        self.clips[index] = self.media.faded_out(&closed, fadeout);
    }

    /// Number of clips currently in memory.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Segment files written so far, in creation order.
    pub fn segments(&self) -> &[PathBuf] {
        &self.segments
    }

    /// Flush the closed prefix to disk if the arena has reached its ceiling.
    ///
    /// The flush boundary is the earliest clip an open note still points at;
    /// nothing at or past it leaves memory. With no open notes the whole
    /// arena is flushed.
    pub fn enforce_ceiling(&mut self, open: &mut OpenNotes) -> Result<()> {
        if self.clips.len() < self.ceiling {
            return Ok(());
        }

        let boundary = open.earliest_clip_index().unwrap_or(self.clips.len());
        if boundary < 2 {
            // Merging fewer than two clips cannot shrink the arena.
            debug!(boundary, "ceiling reached but nothing flushable yet");
            return Ok(());
        }

        let path = self.segment_path(self.segments.len());
        info!(
            live = self.clips.len(),
            merging = boundary,
            segment = %path.display(),
            "arena full, merging closed clips"
        );

        self.media.composite_to(&self.clips[..boundary], &path)?;
        let placeholder = self.media.open(&path)?;
        self.segments.push(path);

        let remainder = self.clips.split_off(boundary);
        self.clips.clear();
        self.clips.push(placeholder);
        self.clips.extend(remainder);

        open.rebase(boundary - 1);
        Ok(())
    }

    /// Deterministic segment file name: destination path plus a sequence
    /// number, keeping the destination's container format.
    fn segment_path(&self, index: usize) -> PathBuf {
        let ext = self
            .dest
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mp4".into());
        PathBuf::from(format!("{}.segment{index}.{ext}", self.dest.display()))
    }

    /// Tear down into the remaining clips and the segment paths, for final
    /// assembly.
    pub fn into_parts(self) -> (Vec<M::Clip>, Vec<PathBuf>) {
        (self.clips, self.segments)
    }
}
