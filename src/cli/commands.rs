//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::info;

use crate::capture::{self, list_input_devices, AudioSource, CaptureSession};
use crate::config::RecordConfig;
use crate::engine::{load_wav, resample, save_audio, AudioBuffer, OutputFormat};
use crate::error::Result;

/// Record from the configured device, then resample and save per `config`.
pub fn record(config: &RecordConfig) -> Result<()> {
    config.validate()?;

    let mut session = CaptureSession::open(&config.capture_config())?;
    info!("Recording {}s from '{}'", config.duration_secs, session.device_name());

    // Release the device before touching the filesystem, and even if the
    // recording itself failed.
    let captured = capture_take(&mut session, config);
    let closed = session.close();
    let buffer = captured?;
    closed?;

    save_audio(&buffer, &config.output, config.format)?;

    println!(
        "Recorded {:.2}s ({} Hz, {} channel(s)) to {}",
        buffer.duration_secs(),
        buffer.sample_rate(),
        buffer.num_channels(),
        config.output.display()
    );
    Ok(())
}

/// Record from any source, apply the optional resample, and save.
///
/// Returns the buffer that was written.
pub fn record_from_source<A>(source: &mut A, config: &RecordConfig) -> Result<AudioBuffer<i16>>
where
    A: AudioSource + ?Sized,
{
    let buffer = capture_take(source, config)?;
    save_audio(&buffer, &config.output, config.format)?;
    Ok(buffer)
}

/// Record `config.duration_secs` from `source` and apply the optional
/// resample. Nothing is written to disk.
pub fn capture_take<A>(source: &mut A, config: &RecordConfig) -> Result<AudioBuffer<i16>>
where
    A: AudioSource + ?Sized,
{
    config.validate()?;

    let recorded = capture::record(source, config.duration_secs, config.chunk_size)?;
    match config.resample_to {
        Some(rate) => resample(&recorded, rate),
        None => Ok(recorded),
    }
}

/// Load a WAV file, convert it to `rate`, and save it in `format`.
pub fn resample_file(input: &Path, output: &Path, rate: u32, format: OutputFormat) -> Result<()> {
    info!("Resampling {} to {} Hz", input.display(), rate);

    let buffer = load_wav(input, Some(rate))?;
    save_audio(&buffer, output, format)?;

    println!(
        "Wrote {} samples at {} Hz to {}",
        buffer.len(),
        buffer.sample_rate(),
        output.display()
    );
    Ok(())
}

/// Print every input device name, one per line.
pub fn list_devices() -> Result<()> {
    let devices = list_input_devices()?;

    if devices.is_empty() {
        println!("No input devices found.");
        return Ok(());
    }

    println!("Input devices:");
    for name in devices {
        println!("  {}", name);
    }
    Ok(())
}
