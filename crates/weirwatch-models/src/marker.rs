//! Ground-truth markers.
//!
//! A marker is a point annotation naming a single video frame believed to
//! contain the subject of interest. Marker sources hand us an unordered
//! iterable of frame indices that may contain duplicates; whether
//! duplicates count once or many times is an explicit policy choice, not a
//! silent default.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// How duplicate marker frame indices are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// One marker per unique frame index. Matches the set semantics the
    /// original annotation tooling used.
    #[default]
    Deduplicate,
    /// Every occurrence counts as its own ground-truth event.
    CountEach,
}

/// Ground-truth marker frame indices, normalized per the duplicate policy
/// and sorted ascending.
#[derive(Debug, Clone)]
pub struct MarkerSet {
    indices: Vec<u64>,
    policy: DuplicatePolicy,
}

impl MarkerSet {
    /// Collect markers from an unordered iterable of frame indices.
    pub fn from_indices(indices: impl IntoIterator<Item = u64>, policy: DuplicatePolicy) -> Self {
        let mut indices: Vec<u64> = indices.into_iter().collect();
        indices.sort_unstable();
        if policy == DuplicatePolicy::Deduplicate {
            indices.dedup();
        }
        Self { indices, policy }
    }

    /// The duplicate policy this set was built with.
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Marker frame indices, ascending.
    pub fn indices(&self) -> &[u64] {
        &self.indices
    }

    /// Number of markers after policy normalization.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether the set holds no markers.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The highest marker frame index, if any.
    pub fn max_index(&self) -> Option<u64> {
        self.indices.last().copied()
    }
}

/// Timestamp of a frame index at the given frame rate.
///
/// `frame_index / frame_rate` seconds, rounded to microsecond precision.
pub fn frame_timestamp(frame_index: u64, frame_rate: f64) -> TimeDelta {
    let seconds = frame_index as f64 / frame_rate;
    TimeDelta::microseconds((seconds * 1_000_000.0).round() as i64)
}
