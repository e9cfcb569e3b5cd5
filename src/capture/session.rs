//! Live microphone capture via CPAL.
//!
//! A [`CaptureSession`] owns the input stream for as long as it lives. The
//! device callback converts whatever native format the device delivers to
//! 16-bit PCM and forwards each callback's samples over a bounded channel;
//! `read_chunk` reassembles them into fixed-size chunks on the caller's
//! thread.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, warn};

use super::source::AudioSource;
use super::CaptureConfig;
use crate::engine::Sample;
use crate::error::{AudiorecError, Result};

/// Callback payloads that may queue up before the reader drains them
const CHANNEL_CAPACITY: usize = 256;

/// Extra slack on top of one chunk's duration before a read gives up
const READ_TIMEOUT_SLACK: Duration = Duration::from_secs(2);

/// List input device names so the CLI can offer a selector
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host.input_devices().map_err(AudiorecError::device)?;
    Ok(devices.filter_map(|device| device.name().ok()).collect())
}

/// An open input stream on one device
///
/// Opening starts the stream; [`CaptureSession::close`] stops it. Dropping
/// the session without closing it also stops and releases the device.
pub struct CaptureSession {
    stream: Option<cpal::Stream>,
    receiver: Receiver<Vec<i16>>,
    pending: VecDeque<i16>,
    dropped: Arc<AtomicUsize>,
    device_name: String,
    sample_rate: u32,
    channels: u16,
}

impl CaptureSession {
    /// Open the configured (or default) input device and start capturing
    ///
    /// # Errors
    /// * `InvalidInput` - if the config is invalid
    /// * `Device` - if the device cannot be found or refuses the requested
    ///   rate, channel count or sample format
    pub fn open(config: &CaptureConfig) -> Result<Self> {
        config.validate()?;

        let host = cpal::default_host();
        let device = match config.device.as_deref() {
            Some(name) => host
                .input_devices()
                .map_err(AudiorecError::device)?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| {
                    AudiorecError::device(format!("input device '{}' not found", name))
                })?,
            None => host
                .default_input_device()
                .ok_or_else(|| AudiorecError::device("no default input device available"))?,
        };
        let device_name = device
            .name()
            .unwrap_or_else(|_| "unknown input device".to_string());

        // The device's preferred format decides which callback type cpal hands us;
        // rate and channel count come from the caller.
        let format = device
            .default_input_config()
            .map_err(AudiorecError::device)?
            .sample_format();
        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        debug!(
            "Opening '{}': format={:?} sample_rate={}Hz channels={}",
            device_name, format, config.sample_rate, config.channels
        );

        let (sender, receiver) = bounded(CHANNEL_CAPACITY);
        let dropped = Arc::new(AtomicUsize::new(0));

        let stream = match format {
            SampleFormat::I16 => {
                build_stream(&device, &stream_config, sender, dropped.clone(), |s: i16| s)?
            }
            SampleFormat::F32 => {
                build_stream(&device, &stream_config, sender, dropped.clone(), |s: f32| {
                    i16::from_f64(f64::from(s) * 32767.0)
                })?
            }
            SampleFormat::U16 => {
                build_stream(&device, &stream_config, sender, dropped.clone(), |s: u16| {
                    (i32::from(s) - 32768) as i16
                })?
            }
            other => {
                return Err(AudiorecError::device(format!(
                    "unsupported sample format: {:?}",
                    other
                )))
            }
        };
        stream.play().map_err(AudiorecError::device)?;

        info!(
            "Capturing from '{}' at {} Hz, {} channel(s)",
            device_name, config.sample_rate, config.channels
        );

        Ok(Self {
            stream: Some(stream),
            receiver,
            pending: VecDeque::new(),
            dropped,
            device_name,
            sample_rate: config.sample_rate,
            channels: config.channels,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Callback payloads discarded because the reader fell behind
    pub fn dropped_callbacks(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop the stream and release the device
    pub fn close(mut self) -> Result<()> {
        match self.stream.take() {
            Some(stream) => {
                let paused = stream.pause().map_err(AudiorecError::device);
                drop(stream);
                self.report_drops();
                debug!("Released input device '{}'", self.device_name);
                paused
            }
            None => Ok(()),
        }
    }

    fn report_drops(&self) {
        let dropped = self.dropped_callbacks();
        if dropped > 0 {
            warn!(
                "{} audio callback(s) from '{}' were dropped; the recording has gaps",
                dropped, self.device_name
            );
        }
    }
}

impl AudioSource for CaptureSession {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn read_chunk(&mut self, frames: usize) -> Result<Vec<i16>> {
        if self.stream.is_none() {
            return Err(AudiorecError::device("capture session is closed"));
        }

        let wanted = frames * self.channels as usize;
        let timeout =
            Duration::from_secs_f64(frames as f64 / self.sample_rate as f64) + READ_TIMEOUT_SLACK;

        while self.pending.len() < wanted {
            match self.receiver.recv_timeout(timeout) {
                Ok(samples) => self.pending.extend(samples),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(AudiorecError::device(format!(
                        "no audio from '{}' for {:.1}s; check microphone permissions",
                        self.device_name,
                        timeout.as_secs_f64()
                    )))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(AudiorecError::device(format!(
                        "input stream from '{}' ended",
                        self.device_name
                    )))
                }
            }
        }

        Ok(self.pending.drain(..wanted).collect())
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                warn!("failed to pause audio stream: {}", err);
            }
            self.report_drops();
        }
    }
}

/// Build an input stream whose callback converts samples with `convert`
fn build_stream<T, F>(
    device: &cpal::Device,
    config: &StreamConfig,
    sender: Sender<Vec<i16>>,
    dropped: Arc<AtomicUsize>,
    convert: F,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    F: Fn(T) -> i16 + Send + 'static,
{
    let err_fn = |err| warn!("audio stream error: {}", err);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let samples: Vec<i16> = data.iter().map(|&s| convert(s)).collect();
                if sender.try_send(samples).is_err() {
                    dropped.fetch_add(1, Ordering::Relaxed);
                }
            },
            err_fn,
            None,
        )
        .map_err(AudiorecError::device)
}
