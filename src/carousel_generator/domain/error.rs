use thiserror::Error;

/// Batch-level validation failures. Raised before any slide work starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("backgrounds array is required and must not be empty")]
    EmptyBackgrounds,

    #[error("slides array is required and must not be empty")]
    EmptySlides,

    #[error("backgrounds and slides arrays must have the same length (got {backgrounds} and {slides})")]
    LengthMismatch { backgrounds: usize, slides: usize },

    #[error("Width and height must be between {min} and {max} pixels (got {width}x{height})")]
    DimensionsOutOfRange {
        width: i64,
        height: i64,
        min: u32,
        max: u32,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
