//! WAV file reading and writing.

use crate::{Error, Result, StereoSamples};
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

impl std::fmt::Display for WavFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pcm => "PCM",
            Self::IeeeFloat => "IEEE Float",
        })
    }
}

impl From<SampleFormat> for WavFormat {
    fn from(format: SampleFormat) -> Self {
        match format {
            SampleFormat::Float => Self::IeeeFloat,
            SampleFormat::Int => Self::Pcm,
        }
    }
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let total_samples = u64::from(reader.len()); // across all channels
    let num_frames = total_samples / u64::from(spec.channels.max(1));
    let duration_secs = num_frames as f64 / f64::from(spec.sample_rate);

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs,
        format: spec.sample_format.into(),
    })
}

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Bit depth per sample: 16 or 24 for PCM, 32 for float.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Read a mono or stereo WAV file as stereo frames.
///
/// Mono files are duplicated to both channels. Integer formats are
/// normalized to ±1.
///
/// # Errors
///
/// [`Error::UnsupportedChannels`] for files with more than two channels,
/// [`Error::Empty`] for files without frames.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(StereoSamples, WavSpec)> {
    let path = path.as_ref();
    let reader = WavReader::open(path)?;
    let hound_spec = reader.spec();
    let spec = WavSpec::from(hound_spec);

    tracing::debug!(
        path = %path.display(),
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        "opened WAV file"
    );

    if !matches!(spec.channels, 1 | 2) {
        return Err(Error::UnsupportedChannels(spec.channels));
    }

    let samples: Vec<f32> = match hound_spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let stereo = if spec.channels == 1 {
        StereoSamples::from_mono(samples)
    } else {
        StereoSamples::from_interleaved(&samples)
    };
    if stereo.is_empty() {
        return Err(Error::Empty);
    }

    Ok((stereo, spec))
}

/// Write stereo frames to a WAV file.
///
/// `spec.channels == 1` writes the mono mixdown, `2` writes both
/// channels. 32-bit output is float, 16 and 24-bit are PCM with clipping.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &StereoSamples, spec: WavSpec) -> Result<()> {
    if !matches!(spec.channels, 1 | 2) {
        return Err(Error::UnsupportedChannels(spec.channels));
    }
    if !matches!(spec.bits_per_sample, 16 | 24 | 32) {
        return Err(Error::UnsupportedBitDepth(spec.bits_per_sample));
    }

    let path = path.as_ref();
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;
    let data = if spec.channels == 1 {
        samples.to_mono()
    } else {
        samples.to_interleaved()
    };

    if spec.bits_per_sample == 32 {
        for &sample in &data {
            writer.write_sample(sample)?;
        }
    } else {
        let max_val = (1i32 << (spec.bits_per_sample - 1)) as f32;
        for &sample in &data {
            let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
            writer.write_sample(int_sample)?;
        }
    }

    writer.finalize()?;
    tracing::info!(
        path = %path.display(),
        frames = samples.len(),
        channels = spec.channels,
        bits = spec.bits_per_sample,
        "wrote WAV file"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn ramp(n: usize) -> StereoSamples {
        let left: Vec<f32> = (0..n).map(|i| (i as f32 / n as f32).sin() * 0.9).collect();
        let right = left.iter().map(|s| -s).collect();
        StereoSamples::new(left, right)
    }

    #[test]
    fn test_format_display() {
        assert_eq!(WavFormat::Pcm.to_string(), "PCM");
        assert_eq!(WavFormat::IeeeFloat.to_string(), "IEEE Float");
    }

    #[test]
    fn test_roundtrip_f32_stereo() {
        let samples = ramp(1000);
        let spec = WavSpec::default();

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, spec).unwrap();

        let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
        assert_eq!(loaded_spec, spec);
        assert_eq!(loaded, samples);
    }

    #[test]
    fn test_roundtrip_i16() {
        let samples = ramp(1000);
        let spec = WavSpec {
            bits_per_sample: 16,
            sample_rate: 44100,
            ..WavSpec::default()
        };

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, spec).unwrap();

        let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
        assert_eq!(loaded_spec.sample_rate, 44100);
        // 16-bit has less precision
        for (a, b) in samples.left.iter().zip(&loaded.left) {
            assert!((a - b).abs() < 0.001);
        }
    }

    #[test]
    fn test_mono_file_duplicates() {
        let samples = StereoSamples::from_mono(vec![0.25; 64]);
        let spec = WavSpec {
            channels: 1,
            ..WavSpec::default()
        };

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, spec).unwrap();

        let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
        assert_eq!(loaded_spec.channels, 1);
        assert_eq!(loaded.left, loaded.right);
        assert_eq!(loaded.len(), 64);
    }

    #[test]
    fn test_unsupported_bit_depth() {
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            bits_per_sample: 8,
            ..WavSpec::default()
        };
        let err = write_wav(file.path(), &ramp(4), spec).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBitDepth(8)));
    }

    #[test]
    fn test_info_without_samples() {
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &ramp(4800), WavSpec::default()).unwrap();

        let info = read_wav_info(file.path()).unwrap();
        assert_eq!(info.channels, 2);
        assert_eq!(info.num_frames, 4800);
        assert_eq!(info.format, WavFormat::IeeeFloat);
        assert!((info.duration_secs - 0.1).abs() < 1e-9);
    }
}
