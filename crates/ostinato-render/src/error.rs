//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Pitch/time processing error.
    #[error("DSP error: {0}")]
    Dsp(#[from] ostinato_dsp::Error),

    /// Event file error.
    #[error("score error: {0}")]
    Score(#[from] ostinato_score::Error),

    /// Media collaborator error.
    #[error("media error: {0}")]
    Media(#[from] ostinato_video::Error),

    /// Pitch cache file error.
    #[error("pitch cache error: {0}")]
    Cache(#[from] hound::Error),

    /// Rejected render options.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
