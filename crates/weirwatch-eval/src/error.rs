//! Error types for evaluation.

use thiserror::Error;

/// Result type for evaluation operations.
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while evaluating detections.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The detection record was produced from a different video than the
    /// one being evaluated. Scoring across videos is never meaningful, so
    /// this is fatal rather than a warning.
    #[error("detection record is for video {expected:?}, not {actual:?}")]
    VideoMismatch { expected: String, actual: String },

    /// A marker names a frame past the end of the video, which means the
    /// (video, ground-truth) pairing is inconsistent.
    #[error("marker frame {index} is out of range for a video of {total_frames} frames")]
    MarkerOutOfRange { index: u64, total_frames: u64 },

    #[error(transparent)]
    Model(#[from] weirwatch_models::ModelError),

    #[error(transparent)]
    Detect(#[from] weirwatch_detect::DetectError),
}
