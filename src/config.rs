//! Recording configuration
//!
//! A `record` run is fully described by a [`RecordConfig`]. Values can be
//! loaded from a JSON file, where any missing field falls back to its
//! default, and are then overridden field by field from the command line.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureConfig, DEFAULT_CHUNK_SIZE, DEFAULT_SAMPLE_RATE};
use crate::engine::OutputFormat;
use crate::error::{AudiorecError, Result};

/// Default recording length in seconds
pub const DEFAULT_DURATION_SECS: f64 = 5.0;

/// Default output path
pub const DEFAULT_OUTPUT: &str = "audio.wav";

/// Everything needed to record, optionally resample, and save one take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Recording length in seconds
    pub duration_secs: f64,
    /// Capture rate in Hz
    pub sample_rate: u32,
    /// Number of channels to capture
    pub channels: u16,
    /// Frames read from the device per chunk
    pub chunk_size: usize,
    /// Where to write the result
    pub output: PathBuf,
    /// File format of the result
    pub format: OutputFormat,
    /// Convert to this rate before saving
    pub resample_to: Option<u32>,
    /// Input device name; `None` uses the host default
    pub device: Option<String>,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            chunk_size: DEFAULT_CHUNK_SIZE,
            output: PathBuf::from(DEFAULT_OUTPUT),
            format: OutputFormat::Wav,
            resample_to: None,
            device: None,
        }
    }
}

impl RecordConfig {
    /// Load a config from a JSON file
    ///
    /// # Errors
    /// * `FileNotFound` - if the file does not exist
    /// * `Serialization` - if the JSON is malformed
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AudiorecError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the config as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check every value is usable before touching a device
    pub fn validate(&self) -> Result<()> {
        if !(self.duration_secs.is_finite() && self.duration_secs > 0.0) {
            return Err(AudiorecError::invalid_input(format!(
                "duration must be positive, got {}",
                self.duration_secs
            )));
        }
        if self.resample_to == Some(0) {
            return Err(AudiorecError::invalid_input(
                "resample target rate must be positive",
            ));
        }
        self.capture_config().validate()
    }

    /// The device-facing subset of this config
    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            chunk_size: self.chunk_size,
            device: self.device.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = RecordConfig::default();
        assert_eq!(config.duration_secs, 5.0);
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.output, PathBuf::from("audio.wav"));
        assert_eq!(config.format, OutputFormat::Wav);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RecordConfig =
            serde_json::from_str(r#"{"sample_rate": 16000, "format": "npy"}"#).unwrap();

        assert_eq!(config.sample_rate, 16000);
        assert_eq!(config.format, OutputFormat::Npy);
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.duration_secs, 5.0);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record.json");
        let config = RecordConfig {
            duration_secs: 2.5,
            channels: 2,
            resample_to: Some(16000),
            device: Some("USB Mic".to_string()),
            ..Default::default()
        };

        config.save(&path).unwrap();
        assert_eq!(RecordConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = RecordConfig::load(Path::new("/nonexistent/record.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_load_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        let err = RecordConfig::load(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let zero_duration = RecordConfig {
            duration_secs: 0.0,
            ..Default::default()
        };
        assert!(zero_duration.validate().is_err());

        let zero_rate = RecordConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(zero_rate.validate().is_err());

        let zero_target = RecordConfig {
            resample_to: Some(0),
            ..Default::default()
        };
        assert!(zero_target.validate().is_err());
    }
}
