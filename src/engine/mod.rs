//! Audio Engine Module
//!
//! Core audio handling:
//! - Immutable audio buffers and sample types
//! - Linear-interpolation sample-rate conversion
//! - WAV and NPY file I/O

pub mod buffer;
pub mod io;
pub mod resample;

pub use buffer::{AudioBuffer, Sample};
pub use io::{load_npy, load_wav, save_audio, save_npy, save_wav, OutputFormat};
pub use resample::{resample, Resampler};
