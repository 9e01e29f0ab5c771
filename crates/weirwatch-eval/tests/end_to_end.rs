//! End-to-end tests running the full detect-then-evaluate pipeline over
//! synthetic footage.

use chrono::TimeDelta;
use image::{GrayImage, Luma};

use weirwatch_detect::{detect, detect_record, ImageSequenceSource, MemorySource};
use weirwatch_eval::{evaluate, evaluate_record};
use weirwatch_models::{
    frame_timestamp, DetectionRecord, DetectorConfig, DuplicatePolicy, MarkerSet,
};

const FPS: f64 = 10.0;

fn background() -> GrayImage {
    GrayImage::from_pixel(16, 16, Luma([20]))
}

/// A frame with a bright 8x8 block in the corner, covering a quarter of
/// the frame area.
fn with_fish() -> GrayImage {
    GrayImage::from_fn(16, 16, |x, y| {
        Luma([if x < 8 && y < 8 { 220u8 } else { 20 }])
    })
}

fn config() -> DetectorConfig {
    DetectorConfig {
        blur_kernel_size: 0,
        dilation_iterations: 0,
        timeout: TimeDelta::seconds(2),
        ..DetectorConfig::default()
    }
}

/// Five quiet frames, four with an object, eleven quiet again.
fn footage() -> Vec<GrayImage> {
    let mut images = vec![background(); 5];
    images.extend(vec![with_fish(); 4]);
    images.extend(vec![background(); 11]);
    images
}

#[test]
fn test_detect_then_evaluate_with_matching_marker() {
    let mut source = MemorySource::from_images(footage(), FPS);
    let detections = detect(&config(), &mut source).unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].start, frame_timestamp(5, FPS));

    let markers = MarkerSet::from_indices(vec![6], DuplicatePolicy::Deduplicate);
    let report = evaluate(&detections, &markers, 20, FPS).unwrap();

    assert_eq!(report.frames, 20);
    assert_eq!(report.false_negatives, 0);
    assert_eq!(report.false_positives, 0);
    assert!(report.true_positives >= 4);
    assert_eq!(report.true_negatives, report.frames - report.true_positives);
    assert!(report.mcc > 0.5);
}

#[test]
fn test_detect_then_evaluate_with_missed_marker() {
    let mut source = MemorySource::from_images(footage(), FPS);
    let detections = detect(&config(), &mut source).unwrap();
    assert_eq!(detections.len(), 1);

    // The only marker sits in the quiet lead-in, so the detection is a
    // false positive and the marker a false negative
    let markers = MarkerSet::from_indices(vec![2], DuplicatePolicy::Deduplicate);
    let report = evaluate(&detections, &markers, 20, FPS).unwrap();

    assert_eq!(report.true_positives, 0);
    assert_eq!(report.false_negatives, 1);
    assert!(report.false_positives >= 4);
    assert!(report.mcc < 0.0);
}

#[test]
fn test_image_sequence_to_persisted_record() {
    let dir = tempfile::tempdir().unwrap();
    for (index, image) in footage().into_iter().enumerate() {
        image
            .save(dir.path().join(format!("frame_{:04}.png", index)))
            .unwrap();
    }

    let mut source = ImageSequenceSource::open(dir.path(), FPS).unwrap();
    let record = detect_record(&config(), &mut source, "weir_cam_03.avi").unwrap();
    assert_eq!(record.detections.len(), 1);

    let path = dir.path().join("detections.json");
    record.to_json_file(&path).unwrap();
    let reloaded = DetectionRecord::from_json_file(&path).unwrap();
    assert_eq!(reloaded.video, "weir_cam_03.avi");
    assert_eq!(reloaded.detections, record.detections);
    assert!(reloaded.containing(frame_timestamp(6, FPS)).is_some());
    assert!(reloaded.containing(frame_timestamp(1, FPS)).is_none());

    // Evaluation against a path compares basenames
    let markers = MarkerSet::from_indices(vec![6], DuplicatePolicy::Deduplicate);
    let report =
        evaluate_record(&reloaded, "/footage/2024/weir_cam_03.avi", &markers, 20, FPS).unwrap();
    assert_eq!(report.false_negatives, 0);
}

#[test]
fn test_video_name_mismatch_is_fatal() {
    let mut source = MemorySource::from_images(footage(), FPS);
    let record = detect_record(&config(), &mut source, "weir_cam_03.avi").unwrap();
    let markers = MarkerSet::from_indices(vec![6], DuplicatePolicy::Deduplicate);
    assert!(evaluate_record(&record, "weir_cam_04.avi", &markers, 20, FPS).is_err());
}
