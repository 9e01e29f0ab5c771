//! Weirwatch command-line frontend.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(
    name = "weirwatch",
    about = "Detects animal crossings in frame sequences and scores detections against ground truth",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a frame sequence for interesting activity.
    Detect(commands::DetectArgs),
    /// Score a detection file against ground-truth markers.
    Evaluate(commands::EvaluateArgs),
    /// Print merged sampling windows around ground-truth markers.
    Windows(commands::WindowsArgs),
    /// Check whether anything was detected at a timestamp.
    WasDetected(commands::WasDetectedArgs),
}

fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("weirwatch=info".parse().expect("static directive parses"));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(true)
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Detect(args) => commands::detect(args),
        Command::Evaluate(args) => commands::evaluate(args),
        Command::Windows(args) => commands::windows(args),
        Command::WasDetected(args) => commands::was_detected(args),
    }
}
