//! Evaluation of detection intervals against ground-truth markers.
//!
//! This crate provides:
//! - Confusion-matrix counts and the Matthews correlation coefficient
//! - The evaluator matching markers to sorted detection intervals
//! - Sampling-window construction around sparse labels
//! - An in-process scoring harness for hyperparameter search

pub mod confusion;
pub mod error;
pub mod evaluate;
pub mod score;
pub mod windows;

pub use confusion::ConfusionCounts;
pub use error::{EvalError, EvalResult};
pub use evaluate::{evaluate, evaluate_record, EvaluationReport};
pub use score::ScoreHarness;
pub use windows::{sampling_windows, WindowConfig};
