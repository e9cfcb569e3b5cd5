//! CLI Module
//!
//! Command-line interface for recording, resampling and device listing.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RecordConfig;
use crate::engine::OutputFormat;
use crate::error::Result;

/// audiorec - record microphone audio and save it as WAV or NPY
#[derive(Parser, Debug)]
#[command(name = "audiorec")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a sample from the microphone and save it
    #[command(name = "record")]
    Record(RecordArgs),

    /// Convert the sample rate of an existing WAV file
    #[command(name = "resample")]
    Resample {
        /// Input WAV file
        input: PathBuf,

        /// Output filename
        #[arg(short, long)]
        output: PathBuf,

        /// Target sampling rate in Hz
        #[arg(short, long)]
        rate: u32,

        /// Format in which to save the result
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Wav)]
        format: OutputFormat,
    },

    /// List available input devices
    #[command(name = "devices")]
    Devices,
}

/// Flags for `record`; anything left unset comes from `--config` or the defaults
#[derive(clap::Args, Debug, Default)]
pub struct RecordArgs {
    /// Output filename (default: audio.wav)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Format in which to save the audio sample (default: wav)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Duration of the sample in seconds (default: 5)
    #[arg(short = 't', long = "time")]
    pub duration_secs: Option<f64>,

    /// Sampling rate in Hz (default: 44100)
    #[arg(short, long)]
    pub rate: Option<u32>,

    /// Number of channels (default: 1)
    #[arg(short, long)]
    pub channels: Option<u16>,

    /// Frames read from the device per chunk (default: 1024)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Input device name (default: system default)
    #[arg(long)]
    pub device: Option<String>,

    /// Resample to this rate before saving
    #[arg(long)]
    pub resample_to: Option<u32>,

    /// JSON file with recording settings
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl RecordArgs {
    /// Build the effective config: file (or defaults) first, then flags
    pub fn into_config(self) -> Result<RecordConfig> {
        let mut config = match &self.config {
            Some(path) => RecordConfig::load(path)?,
            None => RecordConfig::default(),
        };

        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(duration) = self.duration_secs {
            config.duration_secs = duration;
        }
        if let Some(rate) = self.rate {
            config.sample_rate = rate;
        }
        if let Some(channels) = self.channels {
            config.channels = channels;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if self.device.is_some() {
            config.device = self.device;
        }
        if self.resample_to.is_some() {
            config.resample_to = self.resample_to;
        }

        Ok(config)
    }
}
