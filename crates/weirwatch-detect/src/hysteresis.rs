//! Hysteresis state machine.
//!
//! Converts the noisy per-frame coverage signal into clean detection
//! intervals. A detection opens on the first interesting frame and refuses
//! to close until a full timeout of quiet has passed, which absorbs flicker
//! in the coverage signal without merging genuinely separate events.
//!
//! ```text
//!                  coverage >= threshold
//!     ┌──────────────────────────────────────────┐
//!     │                                          │
//!     ▼                                          │
//! ┌────────┐                                ┌────────┐
//! │ Active │────────────────────────────────│  Idle  │
//! └────────┘                                └────────┘
//!     │
//!     │  now - last_interesting >= timeout
//!     └───────► emit [first_interesting, last_interesting]
//! ```

use chrono::TimeDelta;

use weirwatch_models::DetectionInterval;

/// Internal state of the detector.
enum State {
    /// No active span.
    Idle,
    /// Accumulating a span.
    Active {
        first_interesting: TimeDelta,
        last_interesting: TimeDelta,
    },
}

/// Converts a `(timestamp, coverage)` stream into detection intervals.
pub struct HysteresisDetector {
    interesting_threshold: f64,
    timeout: TimeDelta,
    state: State,
    last_seen: Option<TimeDelta>,
    intervals: Vec<DetectionInterval>,
}

impl HysteresisDetector {
    /// Create a detector with the given coverage threshold and quiet
    /// timeout.
    ///
    /// A zero timeout is a deliberate degenerate mode: every interesting
    /// frame closes immediately as its own one-frame interval, which is
    /// what per-frame ground-truth comparison wants.
    pub fn new(interesting_threshold: f64, timeout: TimeDelta) -> Self {
        Self {
            interesting_threshold,
            timeout,
            state: State::Idle,
            last_seen: None,
            intervals: Vec::new(),
        }
    }

    /// Feed one frame's coverage measurement. Timestamps must be strictly
    /// increasing.
    pub fn push(&mut self, timestamp: TimeDelta, coverage: f64) {
        self.last_seen = Some(timestamp);

        if coverage >= self.interesting_threshold {
            self.state = match self.state {
                State::Idle => State::Active {
                    first_interesting: timestamp,
                    last_interesting: timestamp,
                },
                State::Active {
                    first_interesting, ..
                } => State::Active {
                    first_interesting,
                    last_interesting: timestamp,
                },
            };
        }

        // The quiet-period check runs against the current timestamp even
        // on interesting frames, so the emitted end is always the last
        // frame that was itself over threshold, never the frame where the
        // timeout fired.
        if let State::Active {
            first_interesting,
            last_interesting,
        } = self.state
        {
            if timestamp - last_interesting >= self.timeout {
                self.intervals
                    .push(DetectionInterval::new(first_interesting, last_interesting));
                self.state = State::Idle;
            }
        }
    }

    /// Intervals finalized so far.
    pub fn finalized(&self) -> &[DetectionInterval] {
        &self.intervals
    }

    /// End of stream: flush a still-open span using the last timestamp
    /// seen and return every interval. Ceasing to pull frames is handled
    /// the same way, so cancellation needs no separate path.
    pub fn finish(mut self) -> Vec<DetectionInterval> {
        if let State::Active {
            first_interesting, ..
        } = self.state
        {
            let end = self.last_seen.unwrap_or(first_interesting);
            self.intervals
                .push(DetectionInterval::new(first_interesting, end));
        }
        self.intervals
    }
}
