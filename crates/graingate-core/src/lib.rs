//! Graingate Core - DSP primitives for the graingate granular noise gate
//!
//! This crate provides the building blocks shared by the grain engine and
//! its hosts, with zero allocation in the audio path.
//!
//! # Core Components
//!
//! ## Timing
//!
//! - [`BeatDivision`] / [`BEAT_DIVISIONS`] - Ordered table of note lengths
//! - [`Timebase`] - Grain lengths in milliseconds or beats
//! - [`grain_length_samples`] - Resolve a grain length for the current tempo
//! - [`TempoManager`] - Transport position and grid crossings
//!
//! ## Dynamics
//!
//! - [`KeyFollower`] / [`Ballistics`] - Smoothed key level for trigger decisions
//!
//! ## Parameters
//!
//! - [`ParameterInfo`] / [`ParamDescriptor`] - Discoverable, clamped settings
//!
//! ## Utilities
//!
//! - [`db_to_linear`], [`linear_to_db`], [`ms_to_sample_count`], [`sanitize_sample_rate`]
//!
//! # no_std Support
//!
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! graingate-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod follower;
pub mod math;
pub mod param_info;
pub mod tempo;

pub use follower::{Ballistics, KeyFollower, MIN_TIME_CONSTANT_MS, smoothing_coeff};
pub use math::{
    MIN_SAMPLE_RATE, db_to_linear, linear_to_db, mono_sum, ms_to_sample_count, ms_to_samples,
    sanitize_sample_rate,
};
pub use param_info::{ParamDescriptor, ParamFlags, ParamId, ParamScale, ParamUnit, ParameterInfo};
pub use tempo::{
    BEAT_DIVISIONS, BeatDivision, DEFAULT_BPM, DEFAULT_DIVISION_INDEX, MAX_BPM, MAX_GRAIN_SECONDS,
    MIN_BPM, TempoManager, Timebase, TransportState, clamp_bpm, grain_length_samples,
    max_grain_samples,
};

/// Error returned when a name does not match any known option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// No beat division has this label.
    UnknownDivision,
    /// No grain shape has this name.
    UnknownShape,
    /// Timebase is neither milliseconds nor beats.
    UnknownTimebase,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParseError::UnknownDivision => write!(f, "unknown beat division"),
            ParseError::UnknownShape => write!(f, "unknown grain shape"),
            ParseError::UnknownTimebase => write!(f, "unknown timebase (expected 'ms' or 'beats')"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}
