//! Microphone capture
//!
//! Audio comes from an [`AudioSource`] that hands out fixed-size chunks of
//! interleaved 16-bit samples. [`record`] reads as many chunks as fit in the
//! requested duration and assembles them into an [`AudioBuffer`].
//! [`CaptureSession`] is the live source backed by a CPAL input stream;
//! [`PcmSource`] replays samples already in memory.

mod session;
mod source;

use serde::{Deserialize, Serialize};

use crate::error::{AudiorecError, Result};

pub use session::{list_input_devices, CaptureSession};
pub use source::{record, AudioSource, PcmSource};

/// Default capture rate (CD quality)
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default number of frames per chunk read from the device
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Settings for opening an input device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Capture rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Frames per chunk
    pub chunk_size: usize,
    /// Input device name; `None` picks the host default
    pub device: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            chunk_size: DEFAULT_CHUNK_SIZE,
            device: None,
        }
    }
}

impl CaptureConfig {
    /// Reject zero rates, channel counts and chunk sizes
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(AudiorecError::invalid_input("sample rate must be positive"));
        }
        if self.channels == 0 {
            return Err(AudiorecError::invalid_input("channel count must be positive"));
        }
        if self.chunk_size == 0 {
            return Err(AudiorecError::invalid_input("chunk size must be positive"));
        }
        Ok(())
    }
}
