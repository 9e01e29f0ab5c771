//! Frame sources.
//!
//! The detector pulls frames synchronously: `next_frame` blocks until the
//! next frame is available and returns `None` at end of stream. Timestamps
//! must be strictly increasing. The caller may simply stop pulling at any
//! point; the pipeline treats that exactly like end of stream.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use image::GrayImage;
use tracing::warn;

use weirwatch_models::frame_timestamp;

use crate::error::{DetectError, DetectResult};

/// A single grayscale video frame.
///
/// Transient: produced by a source, consumed by the pipeline, never
/// persisted by the core.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based frame number within the video.
    pub index: u64,
    /// Presentation timestamp of the frame.
    pub timestamp: TimeDelta,
    /// Grayscale pixel data.
    pub pixels: GrayImage,
}

/// Sequential pull interface over a video's frames.
pub trait FrameSource {
    /// The next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Option<Frame>;

    /// Total number of frames in the video.
    fn total_frames(&self) -> u64;

    /// Frame rate in frames per second.
    fn frame_rate(&self) -> f64;
}

/// A source over frames already decoded into memory.
///
/// Used by the score harness, which replays the same frames for every
/// candidate configuration, and by tests.
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: VecDeque<Frame>,
    total_frames: u64,
    frame_rate: f64,
}

impl MemorySource {
    /// Build a source from pre-decoded frames.
    pub fn new(frames: Vec<Frame>, frame_rate: f64) -> Self {
        let total_frames = frames.len() as u64;
        Self {
            frames: frames.into(),
            total_frames,
            frame_rate,
        }
    }

    /// Build a source of uniform synthetic frames from raw grayscale
    /// buffers, timestamped at the given frame rate.
    pub fn from_images(images: Vec<GrayImage>, frame_rate: f64) -> Self {
        let frames = images
            .into_iter()
            .enumerate()
            .map(|(i, pixels)| Frame {
                index: i as u64,
                timestamp: frame_timestamp(i as u64, frame_rate),
                pixels,
            })
            .collect();
        Self::new(frames, frame_rate)
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    fn total_frames(&self) -> u64 {
        self.total_frames
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }
}

/// A source reading an extracted image sequence from a directory.
///
/// Files are ordered by name and decoded lazily, one per pull, so memory
/// stays flat regardless of sequence length. Frame timestamps derive from
/// the position in the sequence and the configured frame rate.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next_index: u64,
    frame_rate: f64,
}

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

impl ImageSequenceSource {
    /// Open a directory of frame images at the given frame rate.
    pub fn open(dir: impl AsRef<Path>, frame_rate: f64) -> DetectResult<Self> {
        let dir = dir.as_ref();
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(DetectError::InvalidFrameRate(frame_rate));
        }
        if !dir.is_dir() {
            return Err(DetectError::FrameDirNotFound(dir.to_path_buf()));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        if paths.is_empty() {
            return Err(DetectError::EmptyFrameDir(dir.to_path_buf()));
        }
        paths.sort();

        Ok(Self {
            paths,
            next_index: 0,
            frame_rate,
        })
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Option<Frame> {
        let path = self.paths.get(self.next_index as usize)?;
        let pixels = match image::open(path) {
            Ok(decoded) => decoded.to_luma8(),
            Err(err) => {
                // A broken frame file truncates the stream; downstream
                // handles this like any other early end of stream.
                warn!(path = %path.display(), error = %err, "failed to decode frame, ending stream");
                self.next_index = self.paths.len() as u64;
                return None;
            }
        };
        let index = self.next_index;
        self.next_index += 1;
        Some(Frame {
            index,
            timestamp: frame_timestamp(index, self.frame_rate),
            pixels,
        })
    }

    fn total_frames(&self) -> u64 {
        self.paths.len() as u64
    }

    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }
}

/// Decorator retaining the last `capacity` frames pulled through it.
///
/// This replaces decoder seek-and-rewind: when the hysteresis span needs to
/// be backdated to the first interesting frame, the recent frames are still
/// on hand without re-reading the video.
pub struct BufferedSource<S> {
    inner: S,
    buffer: VecDeque<Frame>,
    capacity: usize,
}

impl<S: FrameSource> BufferedSource<S> {
    /// Wrap a source, retaining up to `capacity` recent frames.
    pub fn new(inner: S, capacity: usize) -> Self {
        Self {
            inner,
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// The retained frames, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &Frame> {
        self.buffer.iter()
    }

    /// Retained frames at or after the given timestamp, oldest first.
    pub fn recent_since(&self, timestamp: TimeDelta) -> impl Iterator<Item = &Frame> {
        self.buffer.iter().filter(move |f| f.timestamp >= timestamp)
    }

    /// Unwrap the inner source.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: FrameSource> FrameSource for BufferedSource<S> {
    fn next_frame(&mut self) -> Option<Frame> {
        let frame = self.inner.next_frame()?;
        if self.capacity > 0 {
            if self.buffer.len() == self.capacity {
                self.buffer.pop_front();
            }
            self.buffer.push_back(frame.clone());
        }
        Some(frame)
    }

    fn total_frames(&self) -> u64 {
        self.inner.total_frames()
    }

    fn frame_rate(&self) -> f64 {
        self.inner.frame_rate()
    }
}
