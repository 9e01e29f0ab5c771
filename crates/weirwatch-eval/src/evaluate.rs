//! The evaluator.
//!
//! Matches ground-truth markers against a finalized, sorted detection list
//! and derives frame-level confusion counts plus the MCC.
//!
//! Marker matching uses closed-interval inclusion (`start <= t <= end`).
//! Earlier implementations wavered between inclusive and exclusive endpoint
//! tests; inclusive is the documented choice here and is pinned by tests.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use weirwatch_models::{frame_timestamp, DetectionInterval, DetectionRecord, MarkerSet};

use crate::confusion::ConfusionCounts;
use crate::error::{EvalError, EvalResult};

/// The evaluation summary written as the report JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Total frames in the evaluated video.
    pub frames: u64,
    pub true_positives: u64,
    pub false_positives: u64,
    pub true_negatives: u64,
    pub false_negatives: u64,
    /// Matthews correlation coefficient over the counts above.
    pub mcc: f64,
}

impl EvaluationReport {
    fn from_counts(counts: ConfusionCounts, total_frames: u64) -> Self {
        Self {
            frames: total_frames,
            true_positives: counts.true_positive_frames,
            false_positives: counts.false_positive_frames,
            true_negatives: counts.true_negative_frames,
            false_negatives: counts.false_negative_markers,
            mcc: counts.mcc(),
        }
    }

    /// The underlying confusion counts.
    pub fn counts(&self) -> ConfusionCounts {
        ConfusionCounts {
            true_positive_frames: self.true_positives,
            false_positive_frames: self.false_positives,
            true_negative_frames: self.true_negatives,
            false_negative_markers: self.false_negatives,
        }
    }
}

/// Evaluate a persisted detection record against a video's ground truth.
///
/// The record's `video` field must name the same video (compared by
/// basename) or the evaluation aborts; scoring one video's detections
/// against another's markers silently would poison every downstream
/// number.
pub fn evaluate_record(
    record: &DetectionRecord,
    video: &str,
    markers: &MarkerSet,
    total_frames: u64,
    frame_rate: f64,
) -> EvalResult<EvaluationReport> {
    let expected = basename(&record.video);
    let actual = basename(video);
    if expected != actual {
        return Err(EvalError::VideoMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    evaluate(&record.detections, markers, total_frames, frame_rate)
}

fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

/// Evaluate sorted, non-overlapping detection intervals against markers.
pub fn evaluate(
    detections: &[DetectionInterval],
    markers: &MarkerSet,
    total_frames: u64,
    frame_rate: f64,
) -> EvalResult<EvaluationReport> {
    // A marker past the last frame means the ground truth belongs to a
    // different video; dropping it silently would hide that.
    if let Some(max) = markers.max_index() {
        if total_frames == 0 || max > total_frames - 1 {
            return Err(EvalError::MarkerOutOfRange {
                index: max,
                total_frames,
            });
        }
    }
    if total_frames == 0 {
        return Ok(EvaluationReport::from_counts(
            ConfusionCounts::default(),
            0,
        ));
    }

    // Match each marker to the first interval containing its timestamp,
    // exploiting sortedness to stop as soon as no interval can match.
    let mut matched = vec![0u64; detections.len()];
    let mut false_negative_markers = 0u64;
    for &index in markers.indices() {
        let timestamp = frame_timestamp(index, frame_rate);
        let mut found = false;
        for (i, interval) in detections.iter().enumerate() {
            if interval.contains(timestamp) {
                matched[i] += 1;
                found = true;
                break;
            }
            if interval.end > timestamp {
                break;
            }
        }
        if !found {
            false_negative_markers += 1;
        }
    }

    // Intervals that caught a marker contribute their whole frame span as
    // true positives; empty intervals contribute theirs as false
    // positives. The identical rounding on both sides, and again for the
    // true-negative remainder, keeps the frame identity exact.
    let mut true_positive_frames = 0u64;
    let mut false_positive_frames = 0u64;
    let mut spanned_frames = 0u64;
    for (interval, &hits) in detections.iter().zip(&matched) {
        let span = interval.frame_span(frame_rate);
        spanned_frames += span;
        if hits > 0 {
            true_positive_frames += span;
        } else {
            false_positive_frames += span;
        }
    }

    let true_negative_frames = (total_frames as i64
        - false_negative_markers as i64
        - spanned_frames as i64)
        .max(0) as u64;

    let counts = ConfusionCounts {
        true_positive_frames,
        false_positive_frames,
        true_negative_frames,
        false_negative_markers,
    };
    info!(
        frames = total_frames,
        true_positives = counts.true_positive_frames,
        false_positives = counts.false_positive_frames,
        true_negatives = counts.true_negative_frames,
        false_negatives = counts.false_negative_markers,
        mcc = counts.mcc(),
        "evaluation complete"
    );
    Ok(EvaluationReport::from_counts(counts, total_frames))
}
