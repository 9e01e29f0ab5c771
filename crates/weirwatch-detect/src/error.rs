//! Error types for detection.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for detection operations.
pub type DetectResult<T> = Result<T, DetectError>;

/// Errors that can occur while running the detector.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Frame dimensions changed mid-stream. The background model requires
    /// constant frame dimensions for its whole lifetime; this is a caller
    /// precondition violation, not a recoverable runtime condition.
    #[error(
        "frame size changed mid-stream: expected {expected_width}x{expected_height}, \
         got {actual_width}x{actual_height}"
    )]
    FrameSizeChanged {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("frame directory not found: {0}")]
    FrameDirNotFound(PathBuf),

    #[error("no frames found in {0}")]
    EmptyFrameDir(PathBuf),

    #[error("frame rate must be positive, got {0}")]
    InvalidFrameRate(f64),

    #[error(transparent)]
    Model(#[from] weirwatch_models::ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
}
