// Desktop/tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod check;
mod record;
mod tone;
mod upload;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Voice memo development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the no_std core for the device target and the host build
    Check,
    /// Run all tests (unit, integration, and doc)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Record a synthetic tone through the recorder into a host directory
    Record {
        /// Directory standing in for the SD card (defaults to $MEMO_PATH)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Length of the recording
        #[arg(long, default_value_t = 2.0)]
        seconds: f32,
        /// Channel count written into the header
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=2))]
        channels: u8,
        /// Tone frequency in Hz
        #[arg(long, default_value_t = 440.0)]
        frequency: f32,
    },
    /// Upload a recording from a host directory to an HTTP endpoint
    Upload {
        /// Endpoint, e.g. http://192.168.1.119:8000/upload
        #[arg(long)]
        url: String,
        /// Directory standing in for the SD card (defaults to $MEMO_PATH)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// File inside the directory
        #[arg(long, default_value = "voice_0001.wav")]
        file: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
        Commands::Record {
            out_dir,
            seconds,
            channels,
            frequency,
        } => {
            init_tracing();
            record::run(out_dir, seconds, channels, frequency)
        }
        Commands::Upload { url, dir, file } => {
            init_tracing();
            upload::run(&url, dir, &file)
        }
    }
}
