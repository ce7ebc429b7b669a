//! WAV file I/O for graingate.
//!
//! This crate provides:
//!
//! - **WAV reading**: [`read_wav`] loads mono or stereo files as [`StereoSamples`]
//! - **WAV writing**: [`write_wav`] saves 16/24-bit PCM or 32-bit float
//! - **Metadata**: [`read_wav_info`] reads the header without loading samples
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use graingate_io::{read_wav, write_wav};
//!
//! let (samples, spec) = read_wav("input.wav")?;
//! println!("{} frames at {} Hz", samples.len(), spec.sample_rate);
//! write_wav("copy.wav", &samples, spec)?;
//! ```

mod stereo;
mod wav;

pub use stereo::StereoSamples;
pub use wav::{WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Only mono and stereo files are supported.
    #[error("Unsupported channel count: {0} (expected 1 or 2)")]
    UnsupportedChannels(u16),

    /// Only 16, 24 and 32-bit output is supported.
    #[error("Unsupported bit depth: {0} (expected 16, 24 or 32)")]
    UnsupportedBitDepth(u16),

    /// The file holds no sample frames.
    #[error("WAV file contains no audio")]
    Empty,
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
