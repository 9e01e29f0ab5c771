//! Frame preprocessing.
//!
//! Frames arrive grayscale from the source; the only preprocessing step the
//! detector owns is the configurable blur that suppresses sensor noise
//! before background subtraction.

use image::GrayImage;
use imageproc::filter::{gaussian_blur_f32, median_filter};

use weirwatch_models::{BlurAlgorithm, DetectorConfig};

/// Blur a grayscale frame per the configured algorithm and kernel size.
///
/// A kernel size of 0 disables blurring and returns the frame unchanged.
pub fn blur(frame: &GrayImage, config: &DetectorConfig) -> GrayImage {
    if config.blur_kernel_size == 0 {
        return frame.clone();
    }
    match config.blur_algorithm {
        BlurAlgorithm::Gaussian => {
            gaussian_blur_f32(frame, gaussian_sigma(config.blur_kernel_size))
        }
        BlurAlgorithm::Median => {
            let radius = config.blur_kernel_size / 2;
            median_filter(frame, radius, radius)
        }
    }
}

/// Sigma equivalent to an OpenCV-style kernel size.
///
/// OpenCV derives sigma from kernel size as `0.3*((k-1)*0.5 - 1) + 0.8`
/// when sigma is unspecified; using the same mapping keeps tuned kernel
/// sizes meaningful.
fn gaussian_sigma(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_zero_kernel_is_identity() {
        let frame = GrayImage::from_pixel(8, 8, Luma([42]));
        let config = DetectorConfig {
            blur_kernel_size: 0,
            ..DetectorConfig::default()
        };
        assert_eq!(blur(&frame, &config), frame);
    }

    #[test]
    fn test_gaussian_smooths_impulse() {
        let mut frame = GrayImage::from_pixel(9, 9, Luma([0]));
        frame.put_pixel(4, 4, Luma([255]));
        let config = DetectorConfig {
            blur_kernel_size: 5,
            ..DetectorConfig::default()
        };
        let blurred = blur(&frame, &config);
        assert!(blurred.get_pixel(4, 4)[0] < 255);
        assert_eq!(blurred.dimensions(), frame.dimensions());
    }

    #[test]
    fn test_median_removes_speckle() {
        let mut frame = GrayImage::from_pixel(9, 9, Luma([0]));
        frame.put_pixel(4, 4, Luma([255]));
        let config = DetectorConfig {
            blur_kernel_size: 3,
            blur_algorithm: BlurAlgorithm::Median,
            ..DetectorConfig::default()
        };
        let filtered = blur(&frame, &config);
        assert_eq!(filtered.get_pixel(4, 4)[0], 0);
    }

    #[test]
    fn test_sigma_matches_opencv_mapping() {
        // k=25: 0.3*((25-1)*0.5 - 1) + 0.8 = 4.1
        assert!((gaussian_sigma(25) - 4.1).abs() < 1e-5);
        // k=3 is the smallest useful kernel
        assert!((gaussian_sigma(3) - 0.8).abs() < 1e-5);
    }
}
