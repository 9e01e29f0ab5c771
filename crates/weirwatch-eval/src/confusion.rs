//! Confusion-matrix counts and the Matthews correlation coefficient.

use serde::{Deserialize, Serialize};

/// Frame-level confusion counts for one evaluation.
///
/// The three frame-based counts plus one implied frame per missed marker
/// sum to the video's total frame count; [`ConfusionCounts::frame_total`]
/// reconstructs that sum for the identity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionCounts {
    /// Frames inside detection intervals that matched at least one marker.
    pub true_positive_frames: u64,
    /// Frames inside detection intervals that matched no marker.
    pub false_positive_frames: u64,
    /// Frames outside every detection interval, less the missed markers.
    pub true_negative_frames: u64,
    /// Ground-truth markers no detection interval contained.
    pub false_negative_markers: u64,
}

impl ConfusionCounts {
    /// Frames implied by the missed markers: one frame per marker.
    pub fn implied_false_negative_frames(&self) -> u64 {
        self.false_negative_markers
    }

    /// Sum of all four counts; equals the video's total frame count for a
    /// consistent evaluation.
    pub fn frame_total(&self) -> u64 {
        self.true_positive_frames
            + self.false_positive_frames
            + self.true_negative_frames
            + self.implied_false_negative_frames()
    }

    /// Matthews correlation coefficient.
    ///
    /// `(TP*TN - FP*FN) / sqrt((TP+FP)(TP+FN)(TN+FP)(TN+FN))`, in
    /// `[-1, 1]`. A zero denominator is a defined degenerate case yielding
    /// 0, not an error.
    pub fn mcc(&self) -> f64 {
        let tp = self.true_positive_frames as f64;
        let fp = self.false_positive_frames as f64;
        let tn = self.true_negative_frames as f64;
        let fn_ = self.implied_false_negative_frames() as f64;

        let denominator = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
        if denominator == 0.0 {
            return 0.0;
        }
        (tp * tn - fp * fn_) / denominator
    }
}
