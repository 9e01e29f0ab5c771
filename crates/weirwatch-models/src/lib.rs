//! Shared data models for the weirwatch detection pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Signed days+H:M:S duration strings and their codec
//! - Detection intervals and the on-disk detection record
//! - Ground-truth markers and duplicate handling
//! - Detector configuration (blur, thresholds, background strategy)
//! - Sorted interval sets with merge-overlaps semantics

pub mod config;
pub mod detection;
pub mod duration;
pub mod error;
pub mod interval;
pub mod marker;

// Re-export common types
pub use config::{BackgroundStrategy, BlurAlgorithm, DetectorConfig};
pub use detection::{DetectionInterval, DetectionRecord};
pub use duration::{format_duration, parse_duration, to_seconds};
pub use error::{ModelError, ModelResult};
pub use interval::{IntervalSet, Span};
pub use marker::{frame_timestamp, DuplicatePolicy, MarkerSet};
