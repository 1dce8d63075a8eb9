//! Media-I/O collaborator boundary.
//!
//! The renderer never touches encoded video itself; it manipulates opaque
//! clip handles through the [`MediaLibrary`] trait and lets an implementation
//! do the decoding, transforming, and encoding. This crate defines that
//! contract plus the small value types that cross it, and ships
//! [`FfmpegLibrary`], a glue backend that renders composites by driving the
//! `ffmpeg` command-line tool.
//!
//! Implementations are free to realize clips however they like — the shipped
//! backend accumulates transforms into a descriptor and only does real work
//! at composite time; a test double can simply record the calls.

// Error types
pub mod error;
pub use error::{Error, Result};

mod clip;
mod ffmpeg;
mod library;

pub use clip::{Margin, Rgb, ScreenPosition, POSITION_ROTATION};
pub use ffmpeg::{FfmpegClip, FfmpegLibrary};
pub use library::MediaLibrary;
