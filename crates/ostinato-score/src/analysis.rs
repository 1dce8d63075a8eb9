//! Whole-score analysis.
//!
//! One pass over every track answers everything the renderer needs up front:
//! per-track note-on counts (for main-track selection) and the global pitch
//! range (for sizing the pitch bank).

use std::ops::RangeInclusive;

use tracing::debug;

use crate::error::{Error, Result};
use crate::event::{EventKind, Score};

/// Summary of a score's note content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Note-on count per track, in file order.
    pub counts: Vec<usize>,

    /// Lowest note number seen in any note-on.
    pub lowest: u8,

    /// Highest note number seen in any note-on.
    pub highest: u8,

    /// Index of the main track: the strictly greatest note-on count, ties
    /// broken by first occurrence.
    pub main_track: usize,
}

impl Summary {
    /// Center note: the integer midpoint of the observed range.
    pub fn center(&self) -> u8 {
        (self.lowest as u16 + self.highest as u16).div_euclid(2) as u8
    }

    /// Semitone offsets the pitch bank must cover, inclusive on both ends.
    pub fn offsets(&self) -> RangeInclusive<i32> {
        let center = self.center() as i32;
        (self.lowest as i32 - center)..=(self.highest as i32 - center)
    }
}

/// Analyze a score.
///
/// Fails with [`Error::NoTracks`] for an empty track list and
/// [`Error::NoNotes`] when no track contains a note-on: with no notes there
/// is no main track, no pitch range, and nothing to render.
pub fn analyze(score: &Score) -> Result<Summary> {
    if score.tracks.is_empty() {
        return Err(Error::NoTracks);
    }

    let mut counts = Vec::with_capacity(score.tracks.len());
    let mut lowest = u8::MAX;
    let mut highest = u8::MIN;

    for track in &score.tracks {
        let mut count = 0;
        for event in &track.events {
            if let EventKind::NoteOn { note } = event.kind {
                lowest = lowest.min(note);
                highest = highest.max(note);
                count += 1;
            }
        }
        counts.push(count);
    }

    if counts.iter().all(|&c| c == 0) {
        return Err(Error::NoNotes);
    }

    let mut main_track = 0;
    let mut best = 0;
    for (index, &count) in counts.iter().enumerate() {
        if count > best {
            best = count;
            main_track = index;
        }
    }

    let summary = Summary {
        counts,
        lowest,
        highest,
        main_track,
    };
    debug!(
        main = summary.main_track,
        lowest = summary.lowest,
        highest = summary.highest,
        center = summary.center(),
        "analyzed score"
    );
    Ok(summary)
}
