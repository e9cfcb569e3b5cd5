//! Chunked audio sources and the fixed-duration recording loop.

use log::{debug, info};

use crate::engine::AudioBuffer;
use crate::error::{AudiorecError, Result};

/// Anything that yields interleaved 16-bit audio in fixed-size chunks
pub trait AudioSource {
    /// Rate of the samples this source produces, in Hz
    fn sample_rate(&self) -> u32;

    /// Number of interleaved channels
    fn channels(&self) -> u16;

    /// Block until `frames` frames (`frames * channels` samples) are
    /// available and return them interleaved.
    fn read_chunk(&mut self, frames: usize) -> Result<Vec<i16>>;
}

/// Record `duration_secs` of audio from `source` in chunks of `chunk_size` frames
///
/// Reads `floor(sample_rate / chunk_size * duration_secs)` whole chunks, so
/// the result may be slightly shorter than the requested duration.
///
/// # Errors
/// * `InvalidInput` - for a non-positive duration or chunk size, or when the
///   duration is shorter than a single chunk
/// * any error the source returns while reading
pub fn record<A>(source: &mut A, duration_secs: f64, chunk_size: usize) -> Result<AudioBuffer<i16>>
where
    A: AudioSource + ?Sized,
{
    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return Err(AudiorecError::invalid_input(format!(
            "recording duration must be positive, got {}",
            duration_secs
        )));
    }
    if chunk_size == 0 {
        return Err(AudiorecError::invalid_input("chunk size must be positive"));
    }

    let rate = source.sample_rate();
    let channels = source.channels() as usize;
    let num_chunks = (rate as f64 / chunk_size as f64 * duration_secs).floor() as usize;
    if num_chunks == 0 {
        return Err(AudiorecError::invalid_input(format!(
            "{}s at {} Hz is shorter than one {}-frame chunk",
            duration_secs, rate, chunk_size
        )));
    }

    debug!(
        "Recording {} chunk(s) of {} frames at {} Hz, {} channel(s)",
        num_chunks, chunk_size, rate, channels
    );

    info!("recording...");
    let mut samples = Vec::with_capacity(num_chunks * chunk_size * channels);
    for _ in 0..num_chunks {
        let chunk = source.read_chunk(chunk_size)?;
        samples.extend_from_slice(&chunk);
    }
    info!("finished recording");

    AudioBuffer::from_interleaved(&samples, channels, rate)
}

/// An [`AudioSource`] over interleaved samples already in memory
#[derive(Debug, Clone)]
pub struct PcmSource {
    samples: Vec<i16>,
    position: usize,
    sample_rate: u32,
    channels: u16,
}

impl PcmSource {
    /// Wrap interleaved samples
    ///
    /// # Errors
    /// * `InvalidInput` - for a zero rate or channel count
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(AudiorecError::invalid_input(
                "sample rate and channel count must be positive",
            ));
        }
        Ok(Self {
            samples,
            position: 0,
            sample_rate,
            channels,
        })
    }

    /// Replay an existing buffer
    pub fn from_buffer(buffer: &AudioBuffer<i16>) -> Result<Self> {
        let channels = u16::try_from(buffer.num_channels())
            .map_err(|_| AudiorecError::invalid_input("too many channels"))?;
        Self::new(buffer.to_interleaved(), buffer.sample_rate(), channels)
    }

    /// Samples not yet handed out
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.position
    }
}

impl AudioSource for PcmSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn read_chunk(&mut self, frames: usize) -> Result<Vec<i16>> {
        let wanted = frames * self.channels as usize;
        if self.remaining() < wanted {
            return Err(AudiorecError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "source exhausted: {} samples requested, {} left",
                    wanted,
                    self.remaining()
                ),
            )));
        }

        let chunk = self.samples[self.position..self.position + wanted].to_vec();
        self.position += wanted;
        Ok(chunk)
    }
}
