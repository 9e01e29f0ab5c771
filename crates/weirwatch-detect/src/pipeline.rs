//! The detection pipeline.
//!
//! Wires a frame source through preprocessing, background subtraction,
//! coverage measurement and the hysteresis state machine. Inherently
//! sequential: each background update depends on the previous accumulator
//! state, so one pipeline owns one video from first frame to last.

use tracing::{debug, info};

use weirwatch_models::{DetectionInterval, DetectionRecord, DetectorConfig};

use crate::background::BackgroundModel;
use crate::coverage::CoverageMeter;
use crate::error::DetectResult;
use crate::hysteresis::HysteresisDetector;
use crate::preprocess;
use crate::source::FrameSource;

/// One detection run over one video.
pub struct Detector {
    config: DetectorConfig,
    model: BackgroundModel,
    meter: CoverageMeter,
    hysteresis: HysteresisDetector,
    frames_processed: u64,
}

impl Detector {
    /// Create a detector. Fails if the configuration is invalid.
    pub fn new(config: &DetectorConfig) -> DetectResult<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            model: BackgroundModel::new(&config.background),
            meter: CoverageMeter::new(config.brightness_threshold, config.dilation_iterations),
            hysteresis: HysteresisDetector::new(config.interesting_fraction, config.timeout),
            frames_processed: 0,
        })
    }

    /// Process one frame.
    ///
    /// Returns the frame's coverage fraction, or `None` for the warm-up
    /// frame that seeds the background model.
    pub fn step(&mut self, frame: &crate::source::Frame) -> DetectResult<Option<f64>> {
        let blurred = preprocess::blur(&frame.pixels, &self.config);
        self.frames_processed += 1;

        let Some(map) = self.model.update(&blurred)? else {
            return Ok(None);
        };
        let coverage = self.meter.measure(&map);
        debug!(
            frame = frame.index,
            timestamp = %weirwatch_models::format_duration(&frame.timestamp),
            coverage,
            "measured frame"
        );
        self.hysteresis.push(frame.timestamp, coverage);
        Ok(Some(coverage))
    }

    /// Intervals finalized so far, in emission order.
    pub fn finalized(&self) -> &[DetectionInterval] {
        self.hysteresis.finalized()
    }

    /// End of stream: flush and return the finalized intervals.
    pub fn finish(self) -> Vec<DetectionInterval> {
        let intervals = self.hysteresis.finish();
        info!(
            frames = self.frames_processed,
            intervals = intervals.len(),
            "detection finished"
        );
        intervals
    }
}

/// Run detection over an entire frame source.
pub fn detect<S: FrameSource>(
    config: &DetectorConfig,
    source: &mut S,
) -> DetectResult<Vec<DetectionInterval>> {
    let mut detector = Detector::new(config)?;
    while let Some(frame) = source.next_frame() {
        detector.step(&frame)?;
    }
    Ok(detector.finish())
}

/// Run detection and wrap the result in a persistable record.
pub fn detect_record<S: FrameSource>(
    config: &DetectorConfig,
    source: &mut S,
    video: impl Into<String>,
) -> DetectResult<DetectionRecord> {
    let video = video.into();
    info!(video = %video, "starting detection");
    let detections = detect(config, source)?;
    Ok(DetectionRecord::new(video, config, detections)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use chrono::TimeDelta;
    use image::{GrayImage, Luma};

    fn uniform(value: u8) -> GrayImage {
        GrayImage::from_pixel(16, 16, Luma([value]))
    }

    /// A frame with a bright square covering roughly the given fraction.
    fn with_object(fraction: f64) -> GrayImage {
        let side = ((256.0 * fraction).sqrt().round() as u32).min(16);
        GrayImage::from_fn(16, 16, |x, y| {
            Luma([if x < side && y < side { 255u8 } else { 20 }])
        })
    }

    fn quick_config() -> DetectorConfig {
        DetectorConfig {
            blur_kernel_size: 0,
            dilation_iterations: 0,
            timeout: TimeDelta::seconds(2),
            ..DetectorConfig::default()
        }
    }

    #[test]
    fn test_static_scene_finds_nothing() {
        let mut source = MemorySource::from_images(vec![uniform(20); 10], 1.0);
        let detections = detect(&quick_config(), &mut source).unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn test_empty_stream_finds_nothing() {
        let mut source = MemorySource::from_images(vec![], 1.0);
        let detections = detect(&quick_config(), &mut source).unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn test_object_crossing_is_detected() {
        let mut images = vec![uniform(20); 4];
        images.extend(vec![with_object(0.5); 3]);
        images.extend(vec![uniform(20); 6]);
        let mut source = MemorySource::from_images(images, 1.0);

        let detections = detect(&quick_config(), &mut source).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].start, TimeDelta::seconds(4));
        // The frame after the object leaves also deviates from the
        // polluted background average, extending the interval by one
        assert!(detections[0].end >= TimeDelta::seconds(6));
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let config = DetectorConfig {
            blur_kernel_size: 4,
            ..DetectorConfig::default()
        };
        let mut source = MemorySource::from_images(vec![uniform(0)], 1.0);
        assert!(detect(&config, &mut source).is_err());
    }

    #[test]
    fn test_record_carries_video_and_settings() {
        let mut source = MemorySource::from_images(vec![uniform(20); 3], 1.0);
        let record = detect_record(&quick_config(), &mut source, "weir.avi").unwrap();
        assert_eq!(record.video, "weir.avi");
        assert_eq!(record.settings["blur_kernel_size"], serde_json::json!(0));
        assert!(record.detections.is_empty());
    }
}
