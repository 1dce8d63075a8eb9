//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed MIDI data.
    #[error("MIDI error: {0}")]
    Midi(#[from] midly::Error),

    /// The event file has no tracks at all.
    #[error("event file contains no tracks")]
    NoTracks,

    /// No track contains a single note-on, so there is nothing to schedule
    /// and no pitch range to build.
    #[error("event file contains no note-on events")]
    NoNotes,
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
