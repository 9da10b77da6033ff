//! xtask record: run the recorder against the host filesystem.
//!
//! A synthetic tone stands in for the microphone and a local directory for
//! the SD card, so the full start → tick → stop path runs unchanged.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use platform::storage_local::LocalFileStorage;
use platform::AudioConfig;
use voice::{Recorder, RecordingSummary, VoiceConfig};

use crate::tone::ToneCapture;

/// Recording never uploads; the config still needs an endpoint.
const UNUSED_URL: &str = "http://localhost/upload";

pub fn run(out_dir: Option<PathBuf>, seconds: f32, channels: u8, frequency: f32) -> Result<()> {
    let storage = memo_storage(out_dir)?;
    let root = storage.root().to_path_buf();
    let audio = AudioConfig {
        channels,
        ..AudioConfig::VOICE
    };
    let config = VoiceConfig::new(UNUSED_URL)
        .context("placeholder URL too long")?
        .with_audio(audio);
    let tone = ToneCapture::new(audio, frequency, seconds);

    println!();
    println!(
        "{}",
        format!(
            "🎙  Recording {seconds:.1}s of {frequency:.0} Hz ({} Hz, {channels} ch) into {}",
            audio.sample_rate,
            root.display()
        )
        .cyan()
        .bold()
    );

    let start = Instant::now();
    let summary = runtime()?.block_on(record(storage, tone, &config))?;

    if !summary.header_written {
        eprintln!("{}", "  ⚠ Header rewrite failed, file keeps a zeroed header".yellow());
    }
    println!(
        "{}",
        format!(
            "  ✓ Saved {} ({} PCM bytes) in {:.2}s",
            root.join(summary.path.trim_start_matches('/')).display(),
            summary.data_len,
            start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();
    Ok(())
}

async fn record(
    storage: LocalFileStorage,
    tone: ToneCapture,
    config: &VoiceConfig,
) -> Result<RecordingSummary> {
    let mut recorder = Recorder::setup(storage, Some(tone), config).await;
    if !recorder.is_storage_ready() {
        anyhow::bail!("storage: {}", recorder.status());
    }
    recorder
        .start_recording()
        .await
        .map_err(|e| anyhow!("start: {e} ({})", e.status()))?;
    while recorder.tick().await > 0 {}
    recorder
        .stop_recording()
        .await
        .ok_or_else(|| anyhow!("recorder was not recording"))
}

/// Host directory standing in for the card: `dir`, else `$MEMO_PATH`.
pub(crate) fn memo_storage(dir: Option<PathBuf>) -> Result<LocalFileStorage> {
    match dir {
        Some(dir) => Ok(LocalFileStorage::new(dir)),
        None => LocalFileStorage::from_env().context("pass a directory or set MEMO_PATH"),
    }
}

/// Single-threaded runtime, the host equivalent of the firmware executor.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}
