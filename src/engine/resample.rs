//! Sample-rate conversion by linear interpolation
//!
//! Converts a whole buffer from one rate to another while preserving its
//! duration. Source and target samples are both placed on evenly spaced
//! time axes covering `[0, D]`, where `D = N / file_rate`, and every target
//! sample is a straight-line blend of the two source samples around it.
//!
//! Interpolation runs in `f64`; converting back to the buffer's sample type
//! is a separate quantization step (see [`Sample::from_f64`]).
//!
//! No low-pass filter is applied, so downsampling aliases any content above
//! the new Nyquist frequency.

use log::debug;

use crate::engine::buffer::{AudioBuffer, Sample};
use crate::error::{AudiorecError, Result};

/// Resample `buffer` to `target_rate`
///
/// Returns the input unchanged (cloned) when the rates already match.
///
/// # Errors
/// * `InvalidInput` - if `target_rate` is zero, the buffer has fewer than
///   two samples while the rates differ, or the conversion would produce
///   no samples at all
pub fn resample<S: Sample>(buffer: &AudioBuffer<S>, target_rate: u32) -> Result<AudioBuffer<S>> {
    Resampler::new(buffer.sample_rate(), target_rate)?.process(buffer)
}

/// A validated pair of source and target sample rates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resampler {
    file_rate: u32,
    target_rate: u32,
}

impl Resampler {
    /// Create a resampler converting `file_rate` to `target_rate`
    ///
    /// # Errors
    /// * `InvalidInput` - if either rate is zero
    pub fn new(file_rate: u32, target_rate: u32) -> Result<Self> {
        if file_rate == 0 {
            return Err(AudiorecError::invalid_input("file sample rate must be positive"));
        }
        if target_rate == 0 {
            return Err(AudiorecError::invalid_input(
                "target sample rate must be positive",
            ));
        }
        Ok(Self {
            file_rate,
            target_rate,
        })
    }

    /// Rate of the buffers this resampler accepts, in Hz
    pub fn file_rate(&self) -> u32 {
        self.file_rate
    }

    /// Rate of the buffers this resampler produces, in Hz
    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// True when both rates match and no interpolation pass is needed
    pub fn is_identity(&self) -> bool {
        self.file_rate == self.target_rate
    }

    /// Number of output samples for `input_len` input samples
    ///
    /// `round(input_len * target_rate / file_rate)`, computed exactly in
    /// integer arithmetic with halves rounding up.
    ///
    /// # Errors
    /// * `InvalidInput` - if the result would be zero samples
    pub fn output_len(&self, input_len: usize) -> Result<usize> {
        if self.is_identity() {
            return Ok(input_len);
        }

        let numerator = input_len as u128 * self.target_rate as u128;
        let denominator = self.file_rate as u128;
        let len = ((2 * numerator + denominator) / (2 * denominator)) as usize;

        if len == 0 {
            return Err(AudiorecError::invalid_input(format!(
                "{} samples at {} Hz yield no samples at {} Hz",
                input_len, self.file_rate, self.target_rate
            )));
        }
        Ok(len)
    }

    /// Time in seconds of every output sample for `input_len` input samples
    ///
    /// The points are evenly spaced over `[0, input_len / file_rate]`, first
    /// and last included.
    pub fn output_times(&self, input_len: usize) -> Result<Vec<f64>> {
        let len = self.output_len(input_len)?;
        let duration = input_len as f64 / self.file_rate as f64;

        if len == 1 {
            return Ok(vec![0.0]);
        }

        let last = (len - 1) as f64;
        Ok((0..len).map(|j| duration * j as f64 / last).collect())
    }

    /// Interpolate one channel without quantizing
    ///
    /// # Errors
    /// * `InvalidInput` - if the rates differ and fewer than two samples are
    ///   given, or the output would be empty
    pub fn interpolate(&self, samples: &[f64]) -> Result<Vec<f64>> {
        if self.is_identity() {
            return Ok(samples.to_vec());
        }

        let n = samples.len();
        if n < 2 {
            return Err(AudiorecError::invalid_input(format!(
                "at least 2 samples are needed to interpolate, got {}",
                n
            )));
        }

        let len = self.output_len(n)?;
        if len == 1 {
            return Ok(vec![samples[0]]);
        }

        let src_last = (n - 1) as u128;
        let dst_last = (len - 1) as f64;
        let mut output = Vec::with_capacity(len);

        for j in 0..len {
            // Position in source index space. The integer product keeps the
            // final position exactly equal to n - 1.
            let pos = (j as u128 * src_last) as f64 / dst_last;
            let idx = pos.floor() as usize;

            let sample = if idx >= n - 1 {
                samples[n - 1]
            } else {
                let frac = pos - idx as f64;
                samples[idx] + (samples[idx + 1] - samples[idx]) * frac
            };
            output.push(sample);
        }

        Ok(output)
    }

    /// Resample every channel of `buffer` and quantize to its sample type
    ///
    /// # Errors
    /// * `InvalidInput` - if the buffer's rate is not this resampler's file
    ///   rate, or for any reason listed on [`Resampler::interpolate`]
    pub fn process<S: Sample>(&self, buffer: &AudioBuffer<S>) -> Result<AudioBuffer<S>> {
        if buffer.sample_rate() != self.file_rate {
            return Err(AudiorecError::invalid_input(format!(
                "buffer is at {} Hz but the resampler expects {} Hz",
                buffer.sample_rate(),
                self.file_rate
            )));
        }

        if self.is_identity() {
            return Ok(buffer.clone());
        }

        debug!(
            "Resampling {} channel(s) x {} samples: {} Hz -> {} Hz",
            buffer.num_channels(),
            buffer.len(),
            self.file_rate,
            self.target_rate
        );

        let mut channels: Vec<Vec<S>> = Vec::with_capacity(buffer.num_channels());
        for channel in buffer.channels() {
            let widened: Vec<f64> = channel.iter().map(|&s| s.to_f64()).collect();
            let interpolated = self.interpolate(&widened)?;
            channels.push(interpolated.into_iter().map(S::from_f64).collect());
        }

        AudioBuffer::new(channels, self.target_rate)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn ramp(len: usize, rate: u32) -> AudioBuffer<i16> {
        AudioBuffer::mono((0..len).map(|i| (i * 10) as i16).collect(), rate).unwrap()
    }

    #[test]
    fn test_upsample_ramp() {
        let buffer = AudioBuffer::<i16>::mono(vec![0, 10, 20, 30, 40], 5).unwrap();
        let resampled = resample(&buffer, 10).unwrap();

        assert_eq!(resampled.sample_rate(), 10);
        assert_eq!(resampled.channel(0), &[0, 4, 9, 13, 18, 22, 27, 31, 36, 40]);
    }

    #[test]
    fn test_identity_returns_input() {
        let buffer = AudioBuffer::<i16>::mono(vec![100, 100, 100], 3).unwrap();
        let resampled = resample(&buffer, 3).unwrap();
        assert_eq!(resampled, buffer);
    }

    #[test]
    fn test_identity_skips_length_checks() {
        let single = AudioBuffer::<i16>::mono(vec![7], 8000).unwrap();
        assert_eq!(resample(&single, 8000).unwrap(), single);
    }

    #[test]
    fn test_zero_target_rate_rejected() {
        let err = resample(&ramp(5, 5), 0).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_zero_file_rate_rejected() {
        let err = Resampler::new(0, 16000).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_single_sample_rejected_when_rates_differ() {
        let single = AudioBuffer::<i16>::mono(vec![7], 8000).unwrap();
        let err = resample(&single, 16000).unwrap_err();
        assert!(err.to_string().contains("at least 2 samples"));
    }

    #[test]
    fn test_empty_output_rejected() {
        let buffer = AudioBuffer::<i16>::mono(vec![1, 2], 44100).unwrap();
        let err = resample(&buffer, 1).unwrap_err();
        assert!(err.to_string().contains("yield no samples"));
    }

    #[test]
    fn test_rate_mismatch_rejected() {
        let resampler = Resampler::new(48000, 16000).unwrap();
        assert!(resampler.process(&ramp(10, 44100)).is_err());
    }

    #[test]
    fn test_single_output_sample_is_first_input() {
        let buffer = AudioBuffer::<i16>::mono(vec![5, 9], 100).unwrap();
        let resampled = resample(&buffer, 50).unwrap();
        assert_eq!(resampled.channel(0), &[5]);
    }

    #[test_case(44100, 16000 ; "speech downsample")]
    #[test_case(8000, 48000 ; "telephone upsample")]
    #[test_case(48000, 44100 ; "dvd to cd")]
    #[test_case(22050, 44100 ; "double")]
    #[test_case(7, 3 ; "odd ratio")]
    fn test_length_and_duration_preserved(file_rate: u32, target_rate: u32) {
        let n = 1234;
        let buffer = ramp(n, file_rate);
        let resampled = resample(&buffer, target_rate).unwrap();

        let expected = (n as f64 * target_rate as f64 / file_rate as f64).round() as usize;
        assert_eq!(resampled.len(), expected);

        let quantum = 1.0 / target_rate as f64;
        assert!((resampled.duration_secs() - buffer.duration_secs()).abs() <= quantum);
    }

    #[test_case(44100, 16000 ; "downsample")]
    #[test_case(16000, 44100 ; "upsample")]
    fn test_endpoints_preserved(file_rate: u32, target_rate: u32) {
        let samples: Vec<i16> = vec![-300, 12, 999, -4, 250, 17, 31000, -31000, 5, 77];
        let buffer = AudioBuffer::mono(samples.repeat(50), file_rate).unwrap();
        let resampled = resample(&buffer, target_rate).unwrap();

        let out = resampled.channel(0);
        assert_eq!(out[0], buffer.channel(0)[0]);
        assert_eq!(out[out.len() - 1], buffer.channel(0)[buffer.len() - 1]);
    }

    #[test]
    fn test_output_times_evenly_spaced() {
        let resampler = Resampler::new(5, 10).unwrap();
        let times = resampler.output_times(5).unwrap();

        assert_eq!(times.len(), 10);
        assert_relative_eq!(times[0], 0.0);
        assert_relative_eq!(times[9], 1.0);

        let step = times[1] - times[0];
        for pair in times.windows(2) {
            assert!(pair[1] > pair[0]);
            assert_relative_eq!(pair[1] - pair[0], step, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_channels_resampled_independently() {
        let buffer =
            AudioBuffer::<i16>::new(vec![vec![0, 10, 20, 30, 40], vec![40, 30, 20, 10, 0]], 5)
                .unwrap();
        let resampled = resample(&buffer, 10).unwrap();

        assert_eq!(resampled.num_channels(), 2);
        assert_eq!(resampled.channel(0), &[0, 4, 9, 13, 18, 22, 27, 31, 36, 40]);
        assert_eq!(resampled.channel(1), &[40, 36, 31, 27, 22, 18, 13, 9, 4, 0]);
    }

    #[test]
    fn test_float_buffers_keep_fractional_values() {
        let buffer = AudioBuffer::<f64>::mono(vec![0.0, 10.0, 20.0, 30.0, 40.0], 5).unwrap();
        let resampled = resample(&buffer, 10).unwrap();

        assert_relative_eq!(resampled.channel(0)[1], 40.0 / 9.0, epsilon = 1e-9);
        assert_relative_eq!(resampled.channel(0)[5], 200.0 / 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_input_not_mutated() {
        let buffer = ramp(100, 44100);
        let before = buffer.clone();
        let _ = resample(&buffer, 16000).unwrap();
        assert_eq!(buffer, before);
    }

    #[test]
    fn test_downsample_constant_signal() {
        let buffer = AudioBuffer::<i16>::mono(vec![-1234; 4410], 44100).unwrap();
        let resampled = resample(&buffer, 8000).unwrap();

        assert_eq!(resampled.len(), 800);
        assert!(resampled.channel(0).iter().all(|&s| s == -1234));
    }
}
