use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarstackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read file {path}: {reason}")]
    FileUnreadable { path: PathBuf, reason: String },

    #[error("Failed to decode {path}: {reason}")]
    DecodeFailure { path: PathBuf, reason: String },

    #[error("Plate solve failed: {0}")]
    SolveFailure(String),

    #[error("Need at least {required} stars to build fingerprints, got {found}")]
    InsufficientStars { found: usize, required: usize },

    #[error("No fingerprint matched below epsilon {epsilon} (best distance {best_distance})")]
    NoMatchFound { epsilon: f64, best_distance: f64 },

    #[error("Invalid registration input: {0}")]
    InvalidRegistrationInput(String),

    #[error("Frame shape mismatch: expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Flat-field fit is degenerate: {0}")]
    DegenerateFit(String),

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Batch worker error: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, StarstackError>;
