//! Coverage measurement.
//!
//! Reduces a deviation map to a single scalar: the fraction of frame area
//! occupied by foreground regions after thresholding and dilation.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::background::DeviationMap;

/// Computes the foreground coverage fraction of a deviation map.
#[derive(Debug, Clone, Copy)]
pub struct CoverageMeter {
    /// Binarization threshold; pixels `>= threshold` become foreground.
    /// 0 skips binarization and treats any non-zero deviation as
    /// foreground.
    pub brightness_threshold: u8,
    /// Dilation passes growing foreground regions to close small gaps.
    pub dilation_iterations: u32,
}

impl CoverageMeter {
    pub fn new(brightness_threshold: u8, dilation_iterations: u32) -> Self {
        Self {
            brightness_threshold,
            dilation_iterations,
        }
    }

    /// Fraction of frame area covered by foreground regions.
    ///
    /// Nominally in `[0, 1]`. Pathological region accounting could in
    /// principle exceed 1; callers must tolerate that rather than assert.
    pub fn measure(&self, map: &DeviationMap) -> f64 {
        let total_area = (map.pixels.width() as u64) * (map.pixels.height() as u64);
        if total_area == 0 {
            return 0.0;
        }

        // Binary masks from the adaptive subtractor are already
        // thresholded; a zero threshold keeps every non-zero deviation.
        let mut mask = if map.binary {
            map.pixels.clone()
        } else {
            binarize(&map.pixels, self.brightness_threshold)
        };

        if self.dilation_iterations > 0 {
            let passes = self.dilation_iterations.min(u8::MAX as u32) as u8;
            mask = dilate(&mask, Norm::LInf, passes);
        }

        let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));
        let foreground_area = labels.as_raw().iter().filter(|&&label| label != 0).count();

        foreground_area as f64 / total_area as f64
    }
}

/// Threshold a deviation map into a 0/255 foreground mask.
fn binarize(pixels: &GrayImage, threshold: u8) -> GrayImage {
    let cutoff = threshold.max(1);
    let raw = pixels
        .as_raw()
        .iter()
        .map(|&p| if p >= cutoff { 255u8 } else { 0 })
        .collect();
    GrayImage::from_raw(pixels.width(), pixels.height(), raw)
        .expect("mask buffer matches input dimensions")
}
