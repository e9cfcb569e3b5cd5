//! audiorec - record microphone audio to WAV or NPY
//!
//! A small toolkit around one pipeline: capture a fixed duration of 16-bit
//! audio from an input device, optionally convert its sample rate, and
//! write it to disk.
//!
//! # Architecture
//!
//! - [`capture`]: chunked audio sources, including the live CPAL session
//! - [`engine`]: audio buffers, the linear resampler, and file I/O
//! - [`config`]: serializable recording settings
//! - [`cli`]: the `audiorec` command-line front end

pub mod capture;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;

pub use engine::{resample, AudioBuffer, Resampler, Sample};
pub use error::{AudiorecError, Result};
