//! Background subtraction.
//!
//! A background model owns a running estimate of the static scene for one
//! video. It is fed every frame in order; each update after the first
//! returns a per-pixel deviation map for the coverage meter. The state is
//! exclusively owned and never shared between streams.

use image::GrayImage;

use weirwatch_models::BackgroundStrategy;

use crate::error::{DetectError, DetectResult};

/// Per-pixel deviation from the background estimate.
#[derive(Debug, Clone)]
pub struct DeviationMap {
    /// Deviation intensities, or a 0/255 mask when `binary` is set.
    pub pixels: GrayImage,
    /// Whether the map is already a binary foreground mask. Binary maps
    /// skip the coverage meter's thresholding step.
    pub binary: bool,
}

/// Running background estimate for one video stream.
pub struct BackgroundModel {
    state: State,
}

enum State {
    Ema {
        weight: f32,
        accumulator: Option<Accumulator>,
    },
    Adaptive {
        variance_threshold: f32,
        stats: Option<PixelStats>,
    },
}

struct Accumulator {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

struct PixelStats {
    width: u32,
    height: u32,
    mean: Vec<f32>,
    variance: Vec<f32>,
}

/// Learning rate for the adaptive per-pixel statistics.
const ADAPTIVE_ALPHA: f32 = 0.05;
/// Initial and minimum per-pixel variance, keeping the foreground test
/// stable before the model has seen real scene variation.
const ADAPTIVE_INITIAL_VARIANCE: f32 = 225.0;
const ADAPTIVE_MIN_VARIANCE: f32 = 4.0;

impl BackgroundModel {
    /// Create a model for the configured strategy.
    pub fn new(strategy: &BackgroundStrategy) -> Self {
        let state = match *strategy {
            BackgroundStrategy::Ema { weight } => State::Ema {
                weight: weight as f32,
                accumulator: None,
            },
            BackgroundStrategy::Adaptive { variance_threshold } => State::Adaptive {
                variance_threshold: variance_threshold as f32,
                stats: None,
            },
        };
        Self { state }
    }

    /// Feed the next frame, returning its deviation map.
    ///
    /// The first call seeds the model and returns `None`: the first frame
    /// has nothing to deviate from and can never be interesting. Frame
    /// dimensions must stay constant for the life of the model.
    pub fn update(&mut self, frame: &GrayImage) -> DetectResult<Option<DeviationMap>> {
        match &mut self.state {
            State::Ema { weight, accumulator } => match accumulator {
                None => {
                    *accumulator = Some(Accumulator::seed(frame));
                    Ok(None)
                }
                Some(acc) => {
                    check_dimensions(acc.width, acc.height, frame)?;
                    Ok(Some(acc.update(frame, *weight)))
                }
            },
            State::Adaptive {
                variance_threshold,
                stats,
            } => match stats {
                None => {
                    *stats = Some(PixelStats::seed(frame));
                    Ok(None)
                }
                Some(stats) => {
                    check_dimensions(stats.width, stats.height, frame)?;
                    Ok(Some(stats.update(frame, *variance_threshold)))
                }
            },
        }
    }
}

fn check_dimensions(width: u32, height: u32, frame: &GrayImage) -> DetectResult<()> {
    if frame.width() != width || frame.height() != height {
        return Err(DetectError::FrameSizeChanged {
            expected_width: width,
            expected_height: height,
            actual_width: frame.width(),
            actual_height: frame.height(),
        });
    }
    Ok(())
}

impl Accumulator {
    fn seed(frame: &GrayImage) -> Self {
        Self {
            width: frame.width(),
            height: frame.height(),
            values: frame.as_raw().iter().map(|&p| p as f32).collect(),
        }
    }

    /// `acc = acc*(1-w) + frame*w`, then `|frame - round(acc)|`.
    fn update(&mut self, frame: &GrayImage, weight: f32) -> DeviationMap {
        let mut deviation = Vec::with_capacity(self.values.len());
        for (acc, &pixel) in self.values.iter_mut().zip(frame.as_raw()) {
            let p = pixel as f32;
            *acc = *acc * (1.0 - weight) + p * weight;
            let background = acc.round().clamp(0.0, 255.0);
            deviation.push((p - background).abs() as u8);
        }
        let pixels = GrayImage::from_raw(self.width, self.height, deviation)
            .expect("deviation buffer matches frame dimensions");
        DeviationMap {
            pixels,
            binary: false,
        }
    }
}

impl PixelStats {
    fn seed(frame: &GrayImage) -> Self {
        let len = frame.as_raw().len();
        Self {
            width: frame.width(),
            height: frame.height(),
            mean: frame.as_raw().iter().map(|&p| p as f32).collect(),
            variance: vec![ADAPTIVE_INITIAL_VARIANCE; len],
        }
    }

    /// Classify each pixel against its running Gaussian, then fold the
    /// observation into the statistics.
    fn update(&mut self, frame: &GrayImage, variance_threshold: f32) -> DeviationMap {
        let mut mask = Vec::with_capacity(self.mean.len());
        for ((mean, variance), &pixel) in self
            .mean
            .iter_mut()
            .zip(self.variance.iter_mut())
            .zip(frame.as_raw())
        {
            let p = pixel as f32;
            let diff = p - *mean;
            let foreground = diff * diff > variance_threshold * *variance;
            mask.push(if foreground { 255u8 } else { 0u8 });

            *mean += ADAPTIVE_ALPHA * diff;
            *variance = (*variance + ADAPTIVE_ALPHA * (diff * diff - *variance))
                .max(ADAPTIVE_MIN_VARIANCE);
        }
        let pixels = GrayImage::from_raw(self.width, self.height, mask)
            .expect("mask buffer matches frame dimensions");
        DeviationMap {
            pixels,
            binary: true,
        }
    }
}
