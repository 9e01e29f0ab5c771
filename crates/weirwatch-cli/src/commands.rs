//! Subcommand implementations.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::TimeDelta;
use clap::Args;
use tracing::info;

use weirwatch_detect::{BufferedSource, Detector, FrameSource, ImageSequenceSource};
use weirwatch_eval::{evaluate_record, sampling_windows, WindowConfig};
use weirwatch_models::{
    format_duration, parse_duration, BackgroundStrategy, BlurAlgorithm, DetectionRecord,
    DetectorConfig, DuplicatePolicy, MarkerSet,
};

#[derive(Args)]
pub struct DetectArgs {
    /// Directory of extracted frame images, ordered by filename.
    #[arg(long)]
    frames: PathBuf,

    /// Frame rate of the original video.
    #[arg(long)]
    fps: f64,

    /// Video name recorded in the detection file. Defaults to the frame
    /// directory's basename.
    #[arg(long)]
    video: Option<String>,

    /// Output detection file. Defaults to stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Fraction of frame area that must be covered to be interesting.
    #[arg(long, default_value_t = 0.21)]
    interesting: f64,

    /// Seconds of quiet before an open detection closes. Zero emits one
    /// interval per interesting frame.
    #[arg(long, default_value_t = 2.0)]
    timeout: f64,

    /// Blur kernel size (must be odd, 0 = off).
    #[arg(long, default_value_t = 25)]
    blur_factor: u32,

    /// Use a median blur instead of Gaussian.
    #[arg(long)]
    median: bool,

    /// Brightness threshold (0 = off).
    #[arg(long, default_value_t = 5)]
    threshold: u8,

    /// Number of dilation iterations (0 = off).
    #[arg(long, default_value_t = 2)]
    dilations: u32,

    /// Background average weight for the current frame.
    #[arg(long, default_value_t = 0.6)]
    bg_weight: f64,

    /// Use the adaptive per-pixel subtractor instead of the EMA average.
    #[arg(long)]
    adaptive: bool,

    /// Variance threshold for the adaptive subtractor.
    #[arg(long, default_value_t = 16.0)]
    variance_threshold: f64,

    /// Directory to dump buffered frames into when a detection closes.
    #[arg(long)]
    dump_frames: Option<PathBuf>,

    /// How many recent frames to retain for dumping.
    #[arg(long, default_value_t = 90)]
    preroll: usize,
}

impl DetectArgs {
    fn config(&self) -> DetectorConfig {
        DetectorConfig {
            interesting_fraction: self.interesting,
            timeout: TimeDelta::microseconds((self.timeout * 1_000_000.0).round() as i64),
            blur_kernel_size: self.blur_factor,
            blur_algorithm: if self.median {
                BlurAlgorithm::Median
            } else {
                BlurAlgorithm::Gaussian
            },
            brightness_threshold: self.threshold,
            dilation_iterations: self.dilations,
            background: if self.adaptive {
                BackgroundStrategy::Adaptive {
                    variance_threshold: self.variance_threshold,
                }
            } else {
                BackgroundStrategy::Ema {
                    weight: self.bg_weight,
                }
            },
        }
    }
}

pub fn detect(args: DetectArgs) -> anyhow::Result<()> {
    let video = match &args.video {
        Some(name) => name.clone(),
        None => args
            .frames
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| args.frames.display().to_string()),
    };
    let config = args.config();
    let source = ImageSequenceSource::open(&args.frames, args.fps)
        .with_context(|| format!("opening frame sequence {}", args.frames.display()))?;
    let mut source = BufferedSource::new(source, args.preroll);

    info!(video = %video, frames = source.total_frames(), "starting detection");
    let mut detector = Detector::new(&config)?;
    let mut dumped = 0usize;
    while let Some(frame) = source.next_frame() {
        let closed_before = detector.finalized().len();
        detector.step(&frame)?;
        if let Some(dir) = &args.dump_frames {
            if detector.finalized().len() > closed_before {
                let interval = *detector
                    .finalized()
                    .last()
                    .expect("a freshly closed interval exists");
                dumped += dump_preroll(&source, dir, interval.start)?;
            }
        }
    }
    let detections = detector.finish();
    if args.dump_frames.is_some() {
        info!(frames = dumped, "dumped pre-roll frames");
    }

    let record = DetectionRecord::new(video, &config, detections)?;
    match &args.out {
        Some(path) => record
            .to_json_file(path)
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            serde_json::to_writer_pretty(std::io::stdout().lock(), &record)?;
            println!();
        }
    }
    Ok(())
}

/// Write the buffered frames belonging to a just-closed detection.
fn dump_preroll<S: FrameSource>(
    source: &BufferedSource<S>,
    dir: &Path,
    start: TimeDelta,
) -> anyhow::Result<usize> {
    fs::create_dir_all(dir)?;
    let mut written = 0;
    for frame in source.recent_since(start) {
        let path = dir.join(format!("frame_{:06}.png", frame.index));
        frame
            .pixels
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        written += 1;
    }
    Ok(written)
}

#[derive(Args)]
pub struct EvaluateArgs {
    /// Detection file produced by `detect`.
    #[arg(short = 'j', long)]
    detections: PathBuf,

    /// Path to the evaluated video; compared by basename against the
    /// detection file.
    #[arg(short, long)]
    video: String,

    /// Ground-truth marker file: one frame index per line.
    #[arg(short, long)]
    markers: PathBuf,

    /// Total number of frames in the video.
    #[arg(long)]
    total_frames: u64,

    /// Frame rate of the video.
    #[arg(long)]
    fps: f64,

    /// Count each duplicate marker as its own ground-truth event instead
    /// of deduplicating.
    #[arg(long)]
    count_duplicates: bool,
}

pub fn evaluate(args: EvaluateArgs) -> anyhow::Result<()> {
    let record = DetectionRecord::from_json_file(&args.detections)
        .with_context(|| format!("loading {}", args.detections.display()))?;
    let policy = if args.count_duplicates {
        DuplicatePolicy::CountEach
    } else {
        DuplicatePolicy::Deduplicate
    };
    let markers = MarkerSet::from_indices(load_marker_indices(&args.markers)?, policy);

    let report = evaluate_record(&record, &args.video, &markers, args.total_frames, args.fps)?;
    serde_json::to_writer_pretty(std::io::stdout().lock(), &report)?;
    println!();
    Ok(())
}

#[derive(Args)]
pub struct WindowsArgs {
    /// Ground-truth marker file: one frame index per line.
    #[arg(short, long)]
    markers: PathBuf,

    /// Frame rate of the video.
    #[arg(long)]
    fps: f64,

    /// Total number of frames in the video.
    #[arg(long)]
    total_frames: u64,

    /// Seconds' worth of frames to keep before each marker.
    #[arg(long, default_value_t = 3.0)]
    before: f64,

    /// Seconds' worth of frames to keep after each marker.
    #[arg(long, default_value_t = 3.0)]
    after: f64,
}

pub fn windows(args: WindowsArgs) -> anyhow::Result<()> {
    let markers = MarkerSet::from_indices(
        load_marker_indices(&args.markers)?,
        DuplicatePolicy::Deduplicate,
    );
    let config = WindowConfig {
        before_secs: args.before,
        after_secs: args.after,
    };
    for span in sampling_windows(&markers, args.fps, args.total_frames, &config) {
        println!("{}\t{}", span.start, span.end);
    }
    Ok(())
}

#[derive(Args)]
pub struct WasDetectedArgs {
    /// Detection file produced by `detect`.
    #[arg(short = 'j', long)]
    detections: PathBuf,

    /// Timestamp of an expected detection, as a duration string.
    #[arg(short, long)]
    timestamp: String,
}

pub fn was_detected(args: WasDetectedArgs) -> anyhow::Result<()> {
    let record = DetectionRecord::from_json_file(&args.detections)
        .with_context(|| format!("loading {}", args.detections.display()))?;
    let timestamp = parse_duration(&args.timestamp)?;

    match record.containing(timestamp) {
        Some(interval) => {
            println!(
                "Detected between {} and {}",
                format_duration(&interval.start),
                format_duration(&interval.end)
            );
            Ok(())
        }
        None => {
            println!("Not detected");
            std::process::exit(1);
        }
    }
}

/// Read marker frame indices from a text file, one per line. Blank lines
/// and `#` comments are skipped.
fn load_marker_indices(path: &Path) -> anyhow::Result<Vec<u64>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut indices = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let index: u64 = line
            .parse()
            .with_context(|| format!("{}:{}: not a frame index", path.display(), number + 1))?;
        indices.push(index);
    }
    if indices.is_empty() {
        bail!("no markers found in {}", path.display());
    }
    Ok(indices)
}
