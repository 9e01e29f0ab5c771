//! Sampling windows around sparse labels.
//!
//! Ground-truth markers are rare relative to the footage around them. When
//! preparing frames for review or training, only the stretch around each
//! marker is worth decoding; this builder turns a marker set into the
//! minimal list of contiguous frame ranges covering a window before and
//! after every label, with overlapping windows merged.

use weirwatch_models::{IntervalSet, MarkerSet, Span};

/// How much context to keep around each marker.
#[derive(Debug, Clone, Copy)]
pub struct WindowConfig {
    /// Seconds' worth of frames to keep before a marker.
    pub before_secs: f64,
    /// Seconds' worth of frames to keep after a marker.
    pub after_secs: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            before_secs: 3.0,
            after_secs: 3.0,
        }
    }
}

/// Build merged half-open frame ranges worth retaining around markers.
///
/// Each marker at frame `f` contributes
/// `[max(0, f - before*fps), min(f + after*fps + 1, total_frames))`; ranges
/// are merged once at the end, so densely clustered labels collapse into
/// one window.
pub fn sampling_windows(
    markers: &MarkerSet,
    frame_rate: f64,
    total_frames: u64,
    config: &WindowConfig,
) -> Vec<Span<u64>> {
    let before = (config.before_secs * frame_rate) as u64;
    let after = (config.after_secs * frame_rate) as u64;

    let mut set = IntervalSet::new();
    for &frame in markers.indices() {
        let start = frame.saturating_sub(before);
        let end = (frame + after + 1).min(total_frames);
        set.insert(start, end);
    }
    set.merge_overlaps();
    set.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use weirwatch_models::DuplicatePolicy;

    fn markers(indices: &[u64]) -> MarkerSet {
        MarkerSet::from_indices(indices.iter().copied(), DuplicatePolicy::Deduplicate)
    }

    fn window(before: f64, after: f64) -> WindowConfig {
        WindowConfig {
            before_secs: before,
            after_secs: after,
        }
    }

    #[test]
    fn test_isolated_marker_gets_symmetric_window() {
        let spans = sampling_windows(&markers(&[100]), 10.0, 1000, &window(3.0, 3.0));
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (70, 131));
    }

    #[test]
    fn test_window_clamps_at_video_bounds() {
        let spans = sampling_windows(&markers(&[1, 98]), 10.0, 100, &window(1.0, 1.0));
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].end), (0, 12));
        assert_eq!((spans[1].start, spans[1].end), (88, 100));
    }

    #[test]
    fn test_clustered_markers_merge_into_one_window() {
        let spans = sampling_windows(&markers(&[50, 55, 60]), 10.0, 1000, &window(1.0, 1.0));
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (40, 71));
    }

    #[test]
    fn test_no_markers_no_windows() {
        let spans = sampling_windows(&markers(&[]), 10.0, 1000, &WindowConfig::default());
        assert!(spans.is_empty());
    }
}
