//! Audio file I/O
//!
//! Persists 16-bit PCM buffers as WAV (via hound) or as NumPy `.npy`
//! arrays, and loads them back. WAV input of other bit depths is scaled to
//! the 16-bit range on load, and can be converted to a requested sample
//! rate with the linear resampler.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::info;
use serde::{Deserialize, Serialize};

use crate::engine::buffer::AudioBuffer;
use crate::engine::resample::resample;
use crate::error::{AudiorecError, Result};

/// NPY magic string followed by format version 1.0
const NPY_MAGIC: &[u8] = b"\x93NUMPY";
const NPY_VERSION: [u8; 2] = [1, 0];

/// Header block (magic + version + length + dict) is padded to this size
const NPY_ALIGNMENT: usize = 64;

/// Dtype descriptor for little-endian 16-bit signed integers
const NPY_DESCR_I16: &str = "<i2";

// ============================================================================
// Output Format
// ============================================================================

/// On-disk format for a recorded buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// RIFF/WAVE, 16-bit integer PCM
    #[default]
    Wav,
    /// NumPy array file, dtype `<i2`
    Npy,
}

impl OutputFormat {
    /// Conventional file extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Npy => "npy",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = AudiorecError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wav" => Ok(OutputFormat::Wav),
            "npy" => Ok(OutputFormat::Npy),
            other => Err(AudiorecError::UnsupportedFormat {
                format: format!("'{}' (please choose npy or wav)", other),
            }),
        }
    }
}

// ============================================================================
// Saving
// ============================================================================

/// Save a buffer in the given format
pub fn save_audio(buffer: &AudioBuffer<i16>, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Wav => save_wav(buffer, path)?,
        OutputFormat::Npy => save_npy(buffer, path)?,
    }

    info!(
        "Saved {:.2}s of audio ({} Hz, {} channel(s)) to {} as {}",
        buffer.duration_secs(),
        buffer.sample_rate(),
        buffer.num_channels(),
        path.display(),
        format
    );
    Ok(())
}

/// Write a buffer as a 16-bit integer PCM WAV file at the buffer's rate
pub fn save_wav(buffer: &AudioBuffer<i16>, path: &Path) -> Result<()> {
    let channels = u16::try_from(buffer.num_channels()).map_err(|_| {
        AudiorecError::UnsupportedFormat {
            format: format!("{}-channel WAV", buffer.num_channels()),
        }
    })?;

    let spec = WavSpec {
        channels,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for sample in buffer.to_interleaved() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}

/// Write a buffer as a NumPy v1.0 `.npy` file
///
/// Mono buffers are stored with shape `(N,)`, multi-channel buffers with
/// shape `(N, C)` in C order (one row per frame). The sample rate is not
/// part of the format.
pub fn save_npy(buffer: &AudioBuffer<i16>, path: &Path) -> Result<()> {
    let shape = if buffer.num_channels() == 1 {
        format!("({},)", buffer.len())
    } else {
        format!("({}, {})", buffer.len(), buffer.num_channels())
    };

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&npy_header(&shape))?;
    for sample in buffer.to_interleaved() {
        writer.write_all(&sample.to_le_bytes())?;
    }
    writer.flush()?;

    Ok(())
}

/// Build the magic, version, header length and padded header dictionary
fn npy_header(shape: &str) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        NPY_DESCR_I16, shape
    );

    // magic(6) + version(2) + header_len(2) + dict + '\n', rounded up
    let unpadded = NPY_MAGIC.len() + NPY_VERSION.len() + 2 + dict.len() + 1;
    let padding = (NPY_ALIGNMENT - unpadded % NPY_ALIGNMENT) % NPY_ALIGNMENT;
    let header_len = dict.len() + padding + 1;

    let mut header = Vec::with_capacity(unpadded + padding);
    header.extend_from_slice(NPY_MAGIC);
    header.extend_from_slice(&NPY_VERSION);
    header.extend_from_slice(&(header_len as u16).to_le_bytes());
    header.extend_from_slice(dict.as_bytes());
    header.extend(std::iter::repeat(b' ').take(padding));
    header.push(b'\n');
    header
}

// ============================================================================
// Loading
// ============================================================================

/// Load a WAV file as 16-bit samples, optionally converting its rate
///
/// Integer input of 8, 24 or 32 bits is shifted into the 16-bit range and
/// 32-bit float input is scaled by 32767. When `rate` is given and differs
/// from the file's rate, the buffer is linearly resampled.
///
/// # Errors
/// * `FileNotFound` - if the file does not exist
/// * `InvalidAudio` - if the file is not a readable WAV file
/// * `UnsupportedFormat` - for bit depths other than those listed above
/// * `InvalidInput` - if resampling is requested and not possible
pub fn load_wav(path: &Path, rate: Option<u32>) -> Result<AudioBuffer<i16>> {
    if !path.exists() {
        return Err(AudiorecError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let reader = WavReader::open(path).map_err(|e| AudiorecError::InvalidAudio {
        reason: format!("failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let samples = read_samples_as_i16(reader, spec)?;
    let buffer = AudioBuffer::from_interleaved(&samples, spec.channels as usize, spec.sample_rate)?;

    info!(
        "Loaded {} ({} Hz, {}-bit, {} channel(s), {} samples)",
        path.display(),
        spec.sample_rate,
        spec.bits_per_sample,
        spec.channels,
        buffer.len()
    );

    match rate {
        Some(target) if target != buffer.sample_rate() => resample(&buffer, target),
        _ => Ok(buffer),
    }
}

/// Read every sample from a WAV reader, converting to 16-bit
fn read_samples_as_i16<R: Read>(mut reader: WavReader<R>, spec: WavSpec) -> Result<Vec<i16>> {
    let samples: std::result::Result<Vec<i16>, hound::Error> =
        match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) => reader
                .samples::<f32>()
                .map(|s| s.map(|v| (v * 32767.0).round().clamp(-32768.0, 32767.0) as i16))
                .collect(),
            (SampleFormat::Int, 8) => reader
                .samples::<i8>()
                .map(|s| s.map(|v| (v as i16) << 8))
                .collect(),
            (SampleFormat::Int, 16) => reader.samples::<i16>().collect(),
            (SampleFormat::Int, 24) => reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v >> 8) as i16))
                .collect(),
            (SampleFormat::Int, 32) => reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v >> 16) as i16))
                .collect(),
            (format, bits) => {
                return Err(AudiorecError::UnsupportedFormat {
                    format: format!("{}-bit {:?} WAV", bits, format),
                })
            }
        };

    samples.map_err(|e| AudiorecError::InvalidAudio {
        reason: format!("failed to read {}-bit samples: {}", spec.bits_per_sample, e),
        source: Some(Box::new(e)),
    })
}

/// Load a `.npy` file written by [`save_npy`]
///
/// NPY files carry no sample rate, so the caller supplies it. Only
/// little-endian 16-bit integer arrays of one or two dimensions in C order
/// are accepted.
pub fn load_npy(path: &Path, sample_rate: u32) -> Result<AudioBuffer<i16>> {
    if !path.exists() {
        return Err(AudiorecError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = BufReader::new(File::open(path)?);

    let mut preamble = [0u8; 10];
    reader
        .read_exact(&mut preamble)
        .map_err(|e| invalid_npy(format!("truncated header: {}", e)))?;
    if &preamble[..6] != NPY_MAGIC {
        return Err(invalid_npy("missing NPY magic string"));
    }
    if preamble[6] != 1 {
        return Err(AudiorecError::UnsupportedFormat {
            format: format!("NPY version {}.{}", preamble[6], preamble[7]),
        });
    }

    let header_len = u16::from_le_bytes([preamble[8], preamble[9]]) as usize;
    let mut header = vec![0u8; header_len];
    reader
        .read_exact(&mut header)
        .map_err(|e| invalid_npy(format!("truncated header: {}", e)))?;
    let header = String::from_utf8_lossy(&header);

    if !header.contains(&format!("'descr': '{}'", NPY_DESCR_I16)) {
        return Err(AudiorecError::UnsupportedFormat {
            format: format!("NPY dtype other than {}", NPY_DESCR_I16),
        });
    }
    if header.contains("'fortran_order': True") {
        return Err(AudiorecError::UnsupportedFormat {
            format: "Fortran-ordered NPY array".to_string(),
        });
    }
    let shape = parse_npy_shape(&header)?;

    let (frames, channels) = match shape.as_slice() {
        [frames] => (*frames, 1),
        [frames, channels] => (*frames, *channels),
        _ => {
            return Err(AudiorecError::UnsupportedFormat {
                format: format!("{}-dimensional NPY array", shape.len()),
            })
        }
    };

    let expected_bytes = frames
        .checked_mul(channels)
        .and_then(|n| n.checked_mul(2))
        .ok_or_else(|| invalid_npy(format!("shape ({}, {}) is too large", frames, channels)))?;

    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    if data.len() != expected_bytes {
        return Err(invalid_npy(format!(
            "expected {} bytes of data, found {}",
            expected_bytes,
            data.len()
        )));
    }

    let samples: Vec<i16> = data
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();

    AudioBuffer::from_interleaved(&samples, channels, sample_rate)
}

/// Extract the integers inside `'shape': (...)`
fn parse_npy_shape(header: &str) -> Result<Vec<usize>> {
    let start = header
        .find("'shape':")
        .and_then(|i| header[i..].find('(').map(|j| i + j + 1))
        .ok_or_else(|| invalid_npy("header has no shape"))?;
    let end = header[start..]
        .find(')')
        .map(|j| start + j)
        .ok_or_else(|| invalid_npy("unterminated shape"))?;

    header[start..end]
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.parse::<usize>()
                .map_err(|_| invalid_npy(format!("bad shape dimension '{}'", dim)))
        })
        .collect()
}

fn invalid_npy(reason: impl Into<String>) -> AudiorecError {
    AudiorecError::InvalidAudio {
        reason: format!("invalid NPY file: {}", reason.into()),
        source: None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use test_case::test_case;

    fn stereo_ramp() -> AudioBuffer<i16> {
        let left: Vec<i16> = (0..100).map(|i| i * 100).collect();
        let right: Vec<i16> = (0..100).map(|i| -i * 100).collect();
        AudioBuffer::new(vec![left, right], 8000).unwrap()
    }

    #[test_case("wav", OutputFormat::Wav)]
    #[test_case("npy", OutputFormat::Npy)]
    #[test_case("WAV", OutputFormat::Wav ; "upper case")]
    fn test_output_format_parse(input: &str, expected: OutputFormat) {
        assert_eq!(input.parse::<OutputFormat>().unwrap(), expected);
    }

    #[test]
    fn test_output_format_rejects_unknown() {
        let err = "mp3".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
        assert!(err.to_string().contains("npy or wav"));
    }

    #[test]
    fn test_wav_round_trip_stereo() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let original = stereo_ramp();

        save_wav(&original, &path).unwrap();
        let loaded = load_wav(&path, None).unwrap();

        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_wav_with_resample() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        let original = AudioBuffer::<i16>::mono(vec![0, 10, 20, 30, 40], 5).unwrap();

        save_wav(&original, &path).unwrap();
        let loaded = load_wav(&path, Some(10)).unwrap();

        assert_eq!(loaded.sample_rate(), 10);
        assert_eq!(loaded.channel(0), &[0, 4, 9, 13, 18, 22, 27, 31, 36, 40]);
    }

    #[test]
    fn test_load_wav_same_rate_is_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("same.wav");
        let original = stereo_ramp();

        save_wav(&original, &path).unwrap();
        assert_eq!(load_wav(&path, Some(8000)).unwrap(), original);
    }

    #[test]
    fn test_load_float_wav_scaled_to_i16() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for v in [0.0_f32, 0.5, -1.0, 1.0] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let loaded = load_wav(&path, None).unwrap();
        assert_eq!(loaded.channel(0), &[0, 16384, -32767, 32767]);
    }

    #[test]
    fn test_load_24bit_wav_shifted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("24bit.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 24,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for v in [0_i32, 256, -8_388_608, 8_388_607] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let loaded = load_wav(&path, None).unwrap();
        assert_eq!(loaded.channel(0), &[0, 1, i16::MIN, i16::MAX]);
    }

    #[test]
    fn test_load_wav_missing_file() {
        let err = load_wav(Path::new("/nonexistent/path/audio.wav"), None).unwrap_err();
        match err {
            AudiorecError::FileNotFound { path } => assert!(path.contains("nonexistent")),
            other => panic!("Expected FileNotFound error, got: {:?}", other),
        }
    }

    #[test]
    fn test_load_wav_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a riff file").unwrap();

        let err = load_wav(&path, None).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AUDIO");
    }

    #[test]
    fn test_npy_header_is_aligned() {
        let header = npy_header("(5,)");
        assert_eq!(header.len() % NPY_ALIGNMENT, 0);
        assert_eq!(&header[..6], NPY_MAGIC);
        assert_eq!(header[header.len() - 1], b'\n');

        let declared = u16::from_le_bytes([header[8], header[9]]) as usize;
        assert_eq!(declared + 10, header.len());
    }

    #[test]
    fn test_npy_mono_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mono.npy");
        let buffer = AudioBuffer::<i16>::mono(vec![1, -2, 300], 44100).unwrap();

        save_npy(&buffer, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();

        let data_offset = 10 + u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        assert_eq!(data_offset % NPY_ALIGNMENT, 0);

        let header = String::from_utf8_lossy(&bytes[10..data_offset]);
        assert!(header.contains("'descr': '<i2'"));
        assert!(header.contains("'shape': (3,)"));
        assert_eq!(&bytes[data_offset..], &[1, 0, 0xFE, 0xFF, 0x2C, 0x01]);
    }

    #[test]
    fn test_npy_round_trip_stereo() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.npy");
        let original = stereo_ramp();

        save_audio(&original, &path, OutputFormat::Npy).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(String::from_utf8_lossy(&bytes[..128]).contains("'shape': (100, 2)"));

        let loaded = load_npy(&path, 8000).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_npy_rejects_truncated_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.npy");
        let mut bytes = npy_header("(4,)");
        bytes.extend_from_slice(&[0, 0, 1, 0]);
        std::fs::write(&path, bytes).unwrap();

        let err = load_npy(&path, 8000).unwrap_err();
        assert!(err.to_string().contains("expected 8 bytes"));
    }

    #[test]
    fn test_load_npy_rejects_oversized_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("huge.npy");
        let mut bytes = npy_header(&format!("({}, 4)", usize::MAX / 2));
        bytes.extend_from_slice(&[0, 0]);
        std::fs::write(&path, bytes).unwrap();

        match load_npy(&path, 8000) {
            Err(AudiorecError::InvalidAudio { reason, .. }) => {
                assert!(reason.contains("too large"))
            }
            other => panic!("Expected InvalidAudio, got: {:?}", other),
        }
    }

    #[test]
    fn test_parse_npy_shape() {
        assert_eq!(parse_npy_shape("{'shape': (12,), }").unwrap(), vec![12]);
        assert_eq!(parse_npy_shape("{'shape': (3, 2), }").unwrap(), vec![3, 2]);
        assert!(parse_npy_shape("{'descr': '<i2'}").is_err());
    }
}
