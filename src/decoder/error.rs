use thiserror::Error;

use crate::models::DumpFormat;

/// Fatal decode failures. No partial frame set accompanies any of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("unrecognized dump format: header matches no known frame signature")]
    UnrecognizedFormat,

    #[error("buffer too short: {len} bytes, need at least {min} for one frame")]
    TooShort { len: usize, min: usize },

    #[error("buffer too large: {len} bytes exceeds limit of {max}")]
    TooLarge { len: usize, max: usize },

    #[error("excessive corruption: {corrupt} of {total} frames failed consistency checks")]
    ExcessiveCorruption { corrupt: u64, total: u64 },

    #[error("declared format {declared} does not match buffer contents ({detected})")]
    FormatMismatch {
        declared: DumpFormat,
        detected: DumpFormat,
    },
}
