//! Track and event data model.

/// What a track event does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A note starts sounding.
    NoteOn { note: u8 },

    /// A note stops sounding.
    NoteOff { note: u8 },

    /// A channel message that is neither note-on nor note-off (controller,
    /// program change, pitch bend, ...). Carries no action for the renderer
    /// but its delta still advances track time.
    Other,

    /// A meta event. Ignored entirely by the renderer; track names are
    /// already extracted at parse time.
    Meta,
}

/// One event within a track, timed relative to its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackEvent {
    /// Offset from the previous event in native ticks.
    pub delta: u32,

    /// Event payload.
    pub kind: EventKind,
}

/// An ordered sequence of events belonging to one musical part.
#[derive(Debug, Clone, Default)]
pub struct Track {
    /// Display name from the track-name meta event, when present.
    pub name: Option<String>,

    /// Events in file order; accumulated deltas give each event's time.
    pub events: Vec<TrackEvent>,
}

impl Track {
    /// Number of note-on events in this track.
    pub fn note_on_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::NoteOn { .. }))
            .count()
    }

    /// Name for logs: the track name, or a placeholder.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }
}

/// A parsed event file: every track, in file order.
#[derive(Debug, Clone, Default)]
pub struct Score {
    pub tracks: Vec<Track>,
}

impl Score {
    /// Move the track at `index` to the front of the processing order.
    ///
    /// The renderer composites the first track full-size beneath all others,
    /// so the main track must come first.
    pub fn promote_main(&mut self, index: usize) {
        if index > 0 && index < self.tracks.len() {
            let main = self.tracks.remove(index);
            self.tracks.insert(0, main);
        }
    }
}
