//! In-process scoring for hyperparameter search.
//!
//! A tuning harness wants to treat the detector and evaluator as one
//! black-box fitness function it can call repeatedly and in parallel. The
//! harness holds a video's frames in memory once and replays them for each
//! candidate configuration; every call builds its own detector state, so
//! calls are independent and safe to run concurrently.

use rayon::prelude::*;
use tracing::warn;

use weirwatch_detect::{detect, Frame, FrameSource, MemorySource};
use weirwatch_models::{DetectorConfig, MarkerSet};

use crate::error::EvalResult;
use crate::evaluate::evaluate;

/// Replays one video's frames against candidate configurations.
pub struct ScoreHarness {
    frames: Vec<Frame>,
    markers: MarkerSet,
    total_frames: u64,
    frame_rate: f64,
}

impl ScoreHarness {
    /// Drain a frame source into memory alongside its ground truth.
    pub fn from_source<S: FrameSource>(mut source: S, markers: MarkerSet) -> Self {
        let total_frames = source.total_frames();
        let frame_rate = source.frame_rate();
        let mut frames = Vec::new();
        while let Some(frame) = source.next_frame() {
            frames.push(frame);
        }
        Self {
            frames,
            markers,
            total_frames,
            frame_rate,
        }
    }

    /// Number of frames held in memory.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Score one configuration: run detection over the held frames and
    /// return the MCC against the ground-truth markers.
    pub fn score(&self, config: &DetectorConfig) -> EvalResult<f64> {
        let mut source = MemorySource::new(self.frames.clone(), self.frame_rate);
        let detections = detect(config, &mut source)?;
        let report = evaluate(
            &detections,
            &self.markers,
            self.total_frames,
            self.frame_rate,
        )?;
        Ok(report.mcc)
    }

    /// Score a population of configurations in parallel.
    ///
    /// A failing configuration scores 0.0 instead of aborting the whole
    /// generation; the tuning loop treats invalid candidates as unfit
    /// rather than fatal.
    pub fn score_population(&self, configs: &[DetectorConfig]) -> Vec<f64> {
        configs
            .par_iter()
            .map(|config| {
                self.score(config).unwrap_or_else(|err| {
                    warn!(error = %err, "scoring candidate failed, assigning zero fitness");
                    0.0
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use image::{GrayImage, Luma};
    use weirwatch_models::DuplicatePolicy;

    fn uniform(value: u8) -> GrayImage {
        GrayImage::from_pixel(16, 16, Luma([value]))
    }

    fn bright_square() -> GrayImage {
        GrayImage::from_fn(16, 16, |x, y| {
            Luma([if x < 11 && y < 11 { 255u8 } else { 20 }])
        })
    }

    /// 12 frames at 1 fps with an object crossing on frames 4..=6.
    fn harness(marker_frames: &[u64]) -> ScoreHarness {
        let mut images = vec![uniform(20); 4];
        images.extend(vec![bright_square(); 3]);
        images.extend(vec![uniform(20); 5]);
        let source = MemorySource::from_images(images, 1.0);
        let markers =
            MarkerSet::from_indices(marker_frames.iter().copied(), DuplicatePolicy::Deduplicate);
        ScoreHarness::from_source(source, markers)
    }

    fn plain_config() -> DetectorConfig {
        DetectorConfig {
            blur_kernel_size: 0,
            dilation_iterations: 0,
            timeout: TimeDelta::seconds(2),
            ..DetectorConfig::default()
        }
    }

    #[test]
    fn test_good_config_scores_positive() {
        let harness = harness(&[5]);
        let score = harness.score(&plain_config()).unwrap();
        assert!(score > 0.0, "expected positive MCC, got {}", score);
    }

    #[test]
    fn test_blind_config_scores_zero() {
        // An interesting fraction of 1.0 never triggers, so no detections
        // and a degenerate (zero-denominator) MCC
        let harness = harness(&[5]);
        let config = plain_config().with_interesting_fraction(1.0);
        assert_eq!(harness.score(&config).unwrap(), 0.0);
    }

    #[test]
    fn test_invalid_config_scores_zero_in_population() {
        let harness = harness(&[5]);
        let invalid = DetectorConfig {
            blur_kernel_size: 2,
            ..plain_config()
        };
        let scores = harness.score_population(&[plain_config(), invalid]);
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > 0.0);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn test_scoring_is_repeatable() {
        // Each call owns fresh detector state, so replaying the same
        // config must give the same fitness
        let harness = harness(&[5]);
        let config = plain_config();
        let first = harness.score(&config).unwrap();
        let second = harness.score(&config).unwrap();
        assert_eq!(first, second);
    }
}
