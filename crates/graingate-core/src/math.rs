//! Mathematical utility functions for grain processing.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Time Conversions
//!
//! - [`ms_to_samples`] - Fractional conversion
//! - [`ms_to_sample_count`] - Rounded, clamped sample counts for grain and stage lengths
//!
//! # Sanitizing
//!
//! - [`sanitize_sample_rate`] - Clamp a host-supplied rate to a usable value

use libm::{expf, logf, roundf};

/// Lowest sample rate accepted anywhere in the engine.
///
/// Rates at or below zero (or NaN) are replaced by this value so every
/// buffer and counter keeps a defined size.
pub const MIN_SAMPLE_RATE: f32 = 1.0;

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use graingate_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Inputs at or below zero are floored at -200 dB.
///
/// # Example
/// ```rust
/// use graingate_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Convert milliseconds to (fractional) samples.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Convert milliseconds to a whole number of samples.
///
/// The result is rounded to the nearest sample and clamped to
/// `[min, max]`. Negative and NaN durations map to `min`.
///
/// # Example
/// ```rust
/// use graingate_core::ms_to_sample_count;
///
/// assert_eq!(ms_to_sample_count(10.0, 1000.0, 0, 100), 10);
/// assert_eq!(ms_to_sample_count(-5.0, 1000.0, 1, 100), 1);
/// assert_eq!(ms_to_sample_count(500.0, 1000.0, 1, 100), 100);
/// ```
#[inline]
pub fn ms_to_sample_count(ms: f32, sample_rate: f32, min: u32, max: u32) -> u32 {
    let samples = roundf(ms_to_samples(ms, sample_rate));
    if samples.is_nan() || samples <= min as f32 {
        return min;
    }
    if samples >= max as f32 {
        return max.max(min);
    }
    samples as u32
}

/// Clamp a sample rate to a usable positive value.
///
/// # Example
/// ```rust
/// use graingate_core::{sanitize_sample_rate, MIN_SAMPLE_RATE};
///
/// assert_eq!(sanitize_sample_rate(48000.0), 48000.0);
/// assert_eq!(sanitize_sample_rate(0.0), MIN_SAMPLE_RATE);
/// assert_eq!(sanitize_sample_rate(f32::NAN), MIN_SAMPLE_RATE);
/// ```
#[inline]
pub fn sanitize_sample_rate(sample_rate: f32) -> f32 {
    if sample_rate.is_finite() && sample_rate >= MIN_SAMPLE_RATE {
        sample_rate
    } else {
        MIN_SAMPLE_RATE
    }
}

/// Mono sum of a stereo pair, scaled by 0.5.
#[inline]
pub fn mono_sum(left: f32, right: f32) -> f32 {
    (left + right) * 0.5
}
