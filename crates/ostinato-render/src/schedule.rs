//! Note scheduling.
//!
//! Walks one track at a time, strictly in event order, turning note-on/
//! note-off pairs into clips. Matching is LIFO per note number: a note-off
//! closes the most recently opened unmatched note of the same pitch.
//!
//! Track time accumulates in native ticks scaled by the speed factor, which
//! the renderer treats as milliseconds; it starts at the warm-up offset so
//! no note lands under the reserved lead clip.

use std::collections::HashMap;

use ostinato_score::{EventKind, Track};
use ostinato_video::{MediaLibrary, ScreenPosition, POSITION_ROTATION};
use tracing::warn;

use crate::bank::PitchBank;
use crate::compose::Compositor;
use crate::error::Result;

/// Time units reserved at the head of every track for the lead clip.
pub(crate) const WARMUP_UNITS: f64 = 1000.0;

/// Duration of the lead clip that pins the canvas size.
pub(crate) const LEAD_SECONDS: f64 = 1.0;

/// Scheduling knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleConfig {
    /// Multiplier from native ticks to schedule milliseconds.
    pub speed: f64,

    /// Tail appended to every closed clip, faded out, in seconds.
    pub fadeout: f64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            speed: 1.5,
            fadeout: 0.2,
        }
    }
}

/// A sounding note awaiting its note-off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenNote {
    /// Note number.
    pub note: u8,

    /// Index of the note's clip in the compositor arena.
    pub clip_index: usize,

    /// Schedule time the note started at, in milliseconds.
    pub start: f64,
}

/// The open notes of one track, as per-note-number stacks.
///
/// Equivalent to a flat list scanned in reverse insertion order for the
/// first same-number entry, but matching pops in O(1) expected time.
#[derive(Debug, Default)]
pub struct OpenNotes {
    stacks: HashMap<u8, Vec<OpenNote>>,
    count: usize,
}

impl OpenNotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a note-on.
    pub fn open(&mut self, note: u8, clip_index: usize, start: f64) {
        self.stacks.entry(note).or_default().push(OpenNote {
            note,
            clip_index,
            start,
        });
        self.count += 1;
    }

    /// Match a note-off: pop the most recently opened note of this number.
    pub fn close(&mut self, note: u8) -> Option<OpenNote> {
        let popped = self.stacks.get_mut(&note).and_then(Vec::pop);
        if popped.is_some() {
            self.count -= 1;
        }
        popped
    }

    /// Clip index of the earliest still-open note, if any.
    ///
    /// Everything before this index is guaranteed closed and safe to flush.
    pub fn earliest_clip_index(&self) -> Option<usize> {
        self.stacks
            .values()
            .flatten()
            .map(|n| n.clip_index)
            .min()
    }

    /// Shift every recorded clip index down after a flush collapsed the
    /// arena prefix into one placeholder.
    pub fn rebase(&mut self, shift: usize) {
        for stack in self.stacks.values_mut() {
            for note in stack.iter_mut() {
                note.clip_index -= shift;
            }
        }
    }

    /// Number of open notes.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no notes are open.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Remove and return every open note, oldest first per pitch.
    pub fn drain(&mut self) -> Vec<OpenNote> {
        self.count = 0;
        let mut notes: Vec<OpenNote> = self.stacks.drain().flat_map(|(_, s)| s).collect();
        notes.sort_by_key(|n| n.clip_index);
        notes
    }
}

/// Turns tracks into timed, positioned, pitch-assigned clips.
pub struct Scheduler<'a, M: MediaLibrary> {
    media: &'a M,
    bank: &'a PitchBank,
    config: ScheduleConfig,
    lowest_note: u8,
    full: M::Clip,
    small: M::Clip,
    position_cursor: usize,
    end_watermark: f64,
}

impl<'a, M: MediaLibrary> Scheduler<'a, M> {
    /// `full` and `small` are the two prepared visual variants of the source;
    /// `lowest_note` anchors note numbers to bank indices.
    pub fn new(
        media: &'a M,
        bank: &'a PitchBank,
        config: ScheduleConfig,
        lowest_note: u8,
        full: M::Clip,
        small: M::Clip,
    ) -> Self {
        Self {
            media,
            bank,
            config,
            lowest_note,
            full,
            small,
            position_cursor: 0,
            end_watermark: 0.0,
        }
    }

    /// Latest end time (seconds) of any closed clip so far.
    pub fn end_watermark(&self) -> f64 {
        self.end_watermark
    }

    /// Schedule one track's events into the compositor.
    ///
    /// The main track keeps the full-size visual and the canvas center;
    /// every other track takes the scaled variant at the next rotation
    /// position. Unmatched note-offs are logged and skipped; notes still
    /// open at track end are closed at the track's final time.
    pub fn schedule_track(
        &mut self,
        compositor: &mut Compositor<'_, M>,
        track: &Track,
        is_main: bool,
    ) -> Result<()> {
        let position = if is_main {
            None
        } else {
            let position = POSITION_ROTATION[self.position_cursor % POSITION_ROTATION.len()];
            self.position_cursor += 1;
            Some(position)
        };

        let mut now = WARMUP_UNITS;
        let mut open = OpenNotes::new();

        for event in &track.events {
            match event.kind {
                EventKind::Meta => continue,
                EventKind::Other => {
                    now += event.delta as f64 * self.config.speed;
                }
                EventKind::NoteOn { note } => {
                    now += event.delta as f64 * self.config.speed;
                    let index = self.open_note(compositor, note, now, is_main, position);
                    open.open(note, index, now);
                    compositor.enforce_ceiling(&mut open)?;
                }
                EventKind::NoteOff { note } => {
                    now += event.delta as f64 * self.config.speed;
                    match open.close(note) {
                        Some(entry) => self.close_note(compositor, entry, now),
                        None => {
                            warn!(note, "note-off without a matching open note; skipped");
                        }
                    }
                    compositor.enforce_ceiling(&mut open)?;
                }
            }
        }

        if !open.is_empty() {
            warn!(
                track = track.display_name(),
                left_open = open.len(),
                "notes still open at track end; closing them at the final time"
            );
            for entry in open.drain() {
                self.close_note(compositor, entry, now);
            }
        }

        Ok(())
    }

    /// Build the clip for a note-on and push it into the arena.
    fn open_note(
        &mut self,
        compositor: &mut Compositor<'_, M>,
        note: u8,
        now: f64,
        is_main: bool,
        position: Option<ScreenPosition>,
    ) -> usize {
        let entry = self
            .bank
            .entry(note.saturating_sub(self.lowest_note) as usize);
        let base = if is_main { &self.full } else { &self.small };

        let mut clip = self.media.with_audio(base, &entry.path);
        clip = self.media.starting_at(&clip, now / 1000.0);
        if let Some(position) = position {
            clip = self.media.positioned(&clip, position);
        }
        compositor.push(clip)
    }

    /// Close a matched note: fix the clip's duration and fade, and raise the
    /// end watermark.
    fn close_note(&mut self, compositor: &mut Compositor<'_, M>, entry: OpenNote, now: f64) {
        let duration = (now - entry.start) / 1000.0 + self.config.fadeout;
        compositor.close(entry.clip_index, duration, self.config.fadeout);
        self.end_watermark = self.end_watermark.max(now / 1000.0 + self.config.fadeout);
    }
}
