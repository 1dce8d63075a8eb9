//! Performance rendering: from parsed notes to a finished video.
//!
//! The stages line up with the data flow, leaf-first:
//!
//! - [`bank`] — one pitch-shifted copy of the source audio per semitone
//!   offset the score needs, cached on disk across runs.
//! - [`schedule`] — walks each track's note on/off events and turns every
//!   matched pair into a positioned, timed clip.
//! - [`compose`] — holds the live clips, flushing closed ones to merged
//!   on-disk segments whenever the in-memory count hits the ceiling.
//! - [`assemble`] — the final merge to the destination file plus temp-file
//!   cleanup.
//! - [`pipeline`] — wires the above together behind one [`render`] call.
//!
//! Everything here is generic over the media collaborator
//! ([`ostinato_video::MediaLibrary`]); nothing in this crate touches encoded
//! video bytes.

// Error types
pub mod error;
pub use error::{Error, Result};

pub mod assemble;
pub mod bank;
pub mod compose;
pub mod pipeline;
pub mod schedule;

pub use assemble::assemble;
pub use bank::{BankConfig, PitchBank, PitchBankEntry, PitchShifter, VocoderShifter};
pub use compose::Compositor;
pub use pipeline::{render, render_with, RenderOptions};
pub use schedule::{OpenNote, OpenNotes, ScheduleConfig, Scheduler};
