//! Error types.

use std::path::PathBuf;

use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV decode error.
    #[error("WAV decode error: {0}")]
    Wav(#[from] hound::Error),

    /// An external media tool exited unsuccessfully.
    #[error("{tool} failed on {path}: {detail}")]
    Tool {
        tool: &'static str,
        path: PathBuf,
        detail: String,
    },

    /// Metadata probing produced something unusable.
    #[error("could not probe {path}: {detail}")]
    Probe { path: PathBuf, detail: String },

    /// The source has no audio stream to lift the performance from.
    #[error("no audio stream in {0}")]
    NoAudio(PathBuf),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
