//! Audio Buffer Management
//!
//! Provides the immutable audio buffer type shared by capture, resampling
//! and persistence, plus the [`Sample`] trait that lets the same buffer
//! carry 16-bit PCM as captured from a microphone or floating-point audio.

use std::fmt::Debug;

use num_traits::Bounded;

use crate::error::{AudiorecError, Result};

// ============================================================================
// Sample Types
// ============================================================================

/// A single amplitude value stored in an [`AudioBuffer`]
///
/// Processing happens in `f64`. Converting back with [`Sample::from_f64`] is
/// the quantization step: integer types round to the nearest value (ties to
/// even) and saturate at their range, float types are a plain cast.
pub trait Sample: Copy + Debug + PartialEq + Send + Sync + 'static {
    /// Widen the sample to `f64` for processing
    fn to_f64(self) -> f64;

    /// Quantize a processed `f64` value back to this sample type
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_int_sample {
    ($($t:ty),*) => {
        $(
            impl Sample for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[inline]
                fn from_f64(value: f64) -> Self {
                    if value.is_nan() {
                        return 0;
                    }
                    let min = <$t as Bounded>::min_value() as f64;
                    let max = <$t as Bounded>::max_value() as f64;
                    value.round_ties_even().clamp(min, max) as $t
                }
            }
        )*
    };
}

impl_int_sample!(i16, i32);

impl Sample for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Sample for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Immutable, non-interleaved audio buffer
///
/// Each channel is a separate `Vec<S>`, all channels have the same length,
/// and the sample rate is always positive. Transformations return a new
/// buffer instead of mutating this one.
///
/// # Example
/// ```
/// use audiorec::engine::AudioBuffer;
///
/// let buffer = AudioBuffer::<i16>::mono(vec![0, 10, 20, 30, 40], 5).unwrap();
/// assert_eq!(buffer.len(), 5);
/// assert_eq!(buffer.duration_secs(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer<S = i16> {
    /// Sample data: outer Vec is channels, inner Vec is samples
    channels: Vec<Vec<S>>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl<S: Sample> AudioBuffer<S> {
    /// Create a buffer from per-channel sample data
    ///
    /// # Errors
    /// * `InvalidInput` - if the rate is zero, there are no channels, or the
    ///   channels differ in length
    pub fn new(channels: Vec<Vec<S>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AudiorecError::invalid_input("sample rate must be positive"));
        }
        if channels.is_empty() {
            return Err(AudiorecError::invalid_input(
                "buffer must have at least one channel",
            ));
        }

        let expected = channels[0].len();
        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, channel)| channel.len() != expected)
        {
            return Err(AudiorecError::invalid_input(format!(
                "channel {} has {} samples, expected {}",
                index,
                channel.len(),
                expected
            )));
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Create a single-channel buffer
    pub fn mono(samples: Vec<S>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Create a buffer from interleaved sample data (L, R, L, R, ... for stereo)
    ///
    /// # Errors
    /// * `InvalidInput` - if `num_channels` is zero or does not divide the
    ///   data length, or if the rate is zero
    pub fn from_interleaved(interleaved: &[S], num_channels: usize, sample_rate: u32) -> Result<Self> {
        if num_channels == 0 {
            return Err(AudiorecError::invalid_input(
                "buffer must have at least one channel",
            ));
        }
        if interleaved.len() % num_channels != 0 {
            return Err(AudiorecError::invalid_input(format!(
                "interleaved data length {} is not divisible by channel count {}",
                interleaved.len(),
                num_channels
            )));
        }

        let frames = interleaved.len() / num_channels;
        let mut channels = vec![Vec::with_capacity(frames); num_channels];
        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                channels[ch].push(sample);
            }
        }

        Self::new(channels, sample_rate)
    }

    /// Convert the buffer to interleaved order (L, R, L, R, ... for stereo)
    pub fn to_interleaved(&self) -> Vec<S> {
        let mut interleaved = Vec::with_capacity(self.num_channels() * self.len());
        for index in 0..self.len() {
            for channel in &self.channels {
                interleaved.push(channel[index]);
            }
        }
        interleaved
    }

    /// Convert every sample to another sample type via `f64`
    ///
    /// Converting to an integer type quantizes; see [`Sample::from_f64`].
    pub fn convert<T: Sample>(&self) -> AudioBuffer<T> {
        AudioBuffer {
            channels: self
                .channels
                .iter()
                .map(|channel| channel.iter().map(|&s| T::from_f64(s.to_f64())).collect())
                .collect(),
            sample_rate: self.sample_rate,
        }
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.first().map(|ch| ch.len()).unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds (`len / sample_rate`)
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[S] {
        &self.channels[index]
    }

    /// All channels, outer slice indexed by channel
    #[inline]
    pub fn channels(&self) -> &[Vec<S>] {
        &self.channels
    }
}

// ============================================================================
// Tests
// ============================================================================
