//! Detection intervals and the on-disk detection record.
//!
//! A detection record is the JSON file the detector writes and the
//! evaluator (and clip-extraction tooling) reads:
//!
//! ```json
//! {
//!     "video": "20170821170158310.avi",
//!     "settings": { ... },
//!     "detections": [["0:00:02", "0:00:03"], ...]
//! }
//! ```
//!
//! Interval endpoints are encoded as duration strings so they survive the
//! round trip with microsecond precision.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::TimeDelta;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::duration::{format_duration, parse_duration, to_seconds};
use crate::error::{ModelError, ModelResult};

/// A contiguous time span the detector judged to contain activity.
///
/// Invariant: `start <= end`. Finalized lists are sorted ascending by
/// `start` and pairwise non-overlapping, with at least the hysteresis
/// timeout between one interval's end and the next one's start. The
/// hysteresis state machine enforces this by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DetectionInterval {
    pub start: TimeDelta,
    pub end: TimeDelta,
}

impl DetectionInterval {
    /// Create an interval. `start` must not exceed `end`.
    pub fn new(start: TimeDelta, end: TimeDelta) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Whether the timestamp falls inside the interval.
    ///
    /// Both boundaries are inclusive. This is the documented resolution of
    /// an ambiguity in earlier implementations, which mixed inclusive and
    /// exclusive endpoint tests when matching markers.
    pub fn contains(&self, timestamp: TimeDelta) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }

    /// Number of frames the interval spans at the given frame rate.
    ///
    /// `round(duration_seconds * frame_rate) + 1`: a zero-length interval
    /// still spans the single frame it was detected on. The evaluator uses
    /// this same rounding for true-positive, false-positive and
    /// true-negative frame counts so they cannot drift apart.
    pub fn frame_span(&self, frame_rate: f64) -> u64 {
        let seconds = to_seconds(&(self.end - self.start));
        (seconds * frame_rate).round() as u64 + 1
    }
}

impl Serialize for DetectionInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeTuple;
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&format_duration(&self.start))?;
        tuple.serialize_element(&format_duration(&self.end))?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for DetectionInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (start_raw, end_raw): (String, String) = Deserialize::deserialize(deserializer)?;
        let start = parse_duration(&start_raw).map_err(D::Error::custom)?;
        let end = parse_duration(&end_raw).map_err(D::Error::custom)?;
        if start > end {
            return Err(D::Error::custom(ModelError::IntervalOrder {
                start: start_raw,
                end: end_raw,
            }));
        }
        Ok(Self { start, end })
    }
}

/// The detection file: which video was scanned, with what settings, and
/// what was found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRecord {
    /// Identifying name of the scanned video, typically a basename. The
    /// evaluator refuses to score a record against a different video.
    pub video: String,

    /// Configuration the detector ran under. Opaque to consumers; kept so
    /// every output file documents how it was produced.
    #[serde(default)]
    pub settings: serde_json::Value,

    /// Finalized detection intervals, sorted ascending by start.
    pub detections: Vec<DetectionInterval>,
}

impl DetectionRecord {
    /// Build a record from a video name, its settings and finalized
    /// intervals.
    pub fn new(
        video: impl Into<String>,
        settings: &impl Serialize,
        detections: Vec<DetectionInterval>,
    ) -> ModelResult<Self> {
        Ok(Self {
            video: video.into(),
            settings: serde_json::to_value(settings)?,
            detections,
        })
    }

    /// Load a record from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::FileNotFound(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the record to a JSON file, pretty-printed.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> ModelResult<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Find the interval containing a timestamp, if any.
    ///
    /// Exploits the sorted order to stop as soon as no later interval can
    /// match.
    pub fn containing(&self, timestamp: TimeDelta) -> Option<&DetectionInterval> {
        for interval in &self.detections {
            if interval.contains(timestamp) {
                return Some(interval);
            }
            if interval.end > timestamp {
                return None;
            }
        }
        None
    }
}
