//! MIDI file parsing.
//!
//! Adapts Standard MIDI Files (SMF) parsed by the `midly` crate into the
//! [`Score`] model. Only note on/off structure and track names survive the
//! conversion; everything else becomes an inert event that at most advances
//! track time.

use std::path::Path;

use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};
use tracing::debug;

use crate::error::Result;
use crate::event::{EventKind, Score, Track, TrackEvent};

impl Score {
    /// Load and parse an event file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(&data)
    }

    /// Parse an event file from bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let smf = Smf::parse(data)?;

        debug!(tracks = smf.tracks.len(), "parsing event file");

        let tracks = smf.tracks.iter().map(convert_track).collect();
        Ok(Score { tracks })
    }
}

/// Convert one midly track into our model.
fn convert_track(track: &midly::Track) -> Track {
    let mut name = None;
    let mut events = Vec::with_capacity(track.len());

    for event in track.iter() {
        let kind = match &event.kind {
            TrackEventKind::Midi { message, .. } => match message {
                // A note-on with velocity zero is a note-off by MIDI
                // convention.
                MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => EventKind::NoteOff {
                    note: key.as_int(),
                },
                MidiMessage::NoteOn { key, .. } => EventKind::NoteOn {
                    note: key.as_int(),
                },
                MidiMessage::NoteOff { key, .. } => EventKind::NoteOff {
                    note: key.as_int(),
                },
                _ => EventKind::Other,
            },
            TrackEventKind::Meta(meta) => {
                if let MetaMessage::TrackName(bytes) = meta {
                    if name.is_none() {
                        name = Some(String::from_utf8_lossy(bytes).into_owned());
                    }
                }
                EventKind::Meta
            }
            _ => EventKind::Meta,
        };

        events.push(TrackEvent {
            delta: event.delta.as_int(),
            kind,
        });
    }

    debug!(
        name = name.as_deref().unwrap_or("(unnamed)"),
        events = events.len(),
        "converted track"
    );

    Track { name, events }
}
