//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Speed/stretch ratio must be a positive finite number.
    #[error("ratio must be positive, got {0}")]
    NonPositiveRatio(f64),

    /// Analysis window size must be a power of two.
    #[error("window size must be a power of two, got {0}")]
    WindowNotPowerOfTwo(usize),

    /// Hop size must be a positive divisor of the window size.
    #[error("hop size {hop} does not divide window size {window}")]
    InvalidHop { hop: usize, window: usize },
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
