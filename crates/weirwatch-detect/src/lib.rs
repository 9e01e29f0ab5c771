#![deny(unreachable_patterns)]
//! Streaming activity detector.
//!
//! This crate turns a time-ordered stream of video frames into a list of
//! non-overlapping detection intervals:
//!
//! ```text
//! ┌─────────────┐   ┌────────────┐   ┌─────────────┐   ┌────────────┐
//! │ FrameSource │──►│ Background │──►│ Coverage    │──►│ Hysteresis │
//! │ (pull)      │   │ model      │   │ meter       │   │ detector   │
//! └─────────────┘   └────────────┘   └─────────────┘   └────────────┘
//!                                                            │
//!                                                            ▼
//!                                               sorted DetectionInterval list
//! ```
//!
//! One [`BackgroundModel`]/[`HysteresisDetector`] pair owns the state for a
//! single video and must see frames strictly in timestamp order. Independent
//! videos can run in parallel, each with its own pair.

pub mod background;
pub mod coverage;
pub mod error;
pub mod hysteresis;
pub mod pipeline;
pub mod preprocess;
pub mod source;

pub use background::{BackgroundModel, DeviationMap};
pub use coverage::CoverageMeter;
pub use error::{DetectError, DetectResult};
pub use hysteresis::HysteresisDetector;
pub use pipeline::{detect, detect_record, Detector};
pub use source::{BufferedSource, Frame, FrameSource, ImageSequenceSource, MemorySource};
