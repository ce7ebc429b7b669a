//! Key-signal level tracking.
//!
//! The trigger detector compares a smoothed key level against its open and
//! close thresholds. [`KeyFollower`] rectifies the key and glides towards
//! it with one-pole smoothing, fast on the way up and slow on the way down.

use libm::expf;

use crate::math::{ms_to_samples, sanitize_sample_rate};

/// Shortest accepted time constant in milliseconds.
pub const MIN_TIME_CONSTANT_MS: f32 = 0.01;

/// Attack and release time constants of a [`KeyFollower`], in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ballistics {
    /// Time constant while the key rises above the level.
    pub attack_ms: f32,
    /// Time constant while the key falls below the level.
    pub release_ms: f32,
}

impl Ballistics {
    /// Ballistics of the gate's trigger detector: 0.1 ms attack, 20 ms release.
    pub const KEY: Self = Self {
        attack_ms: 0.1,
        release_ms: 20.0,
    };

    /// Time constants clamped to at least [`MIN_TIME_CONSTANT_MS`]
    /// (NaN reads as the minimum).
    pub fn new(attack_ms: f32, release_ms: f32) -> Self {
        Self {
            attack_ms: attack_ms.max(MIN_TIME_CONSTANT_MS),
            release_ms: release_ms.max(MIN_TIME_CONSTANT_MS),
        }
    }
}

impl Default for Ballistics {
    fn default() -> Self {
        Self::KEY
    }
}

/// Per-sample smoothing factor for a one-pole with time constant `time_ms`.
///
/// After `time_ms` the distance to a constant target has shrunk to `1/e`.
///
/// ```rust
/// use graingate_core::smoothing_coeff;
///
/// let c = smoothing_coeff(1.0, 48000.0);
/// assert!((c - (-1.0f32 / 48.0).exp()).abs() < 1e-6);
/// ```
pub fn smoothing_coeff(time_ms: f32, sample_rate: f32) -> f32 {
    let samples = ms_to_samples(time_ms.max(MIN_TIME_CONSTANT_MS), sanitize_sample_rate(sample_rate));
    expf(-1.0 / samples)
}

/// Peak follower for the key signal.
///
/// # Example
///
/// ```rust
/// use graingate_core::{Ballistics, KeyFollower};
///
/// let mut key = KeyFollower::new(48000.0, Ballistics::KEY);
/// let mut level = 0.0;
/// for _ in 0..480 {
///     level = key.process(-0.5);
/// }
/// assert!((level - 0.5).abs() < 0.01);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFollower {
    level: f32,
    rise: f32,
    fall: f32,
    ballistics: Ballistics,
}

impl KeyFollower {
    /// Create a silent follower.
    pub fn new(sample_rate: f32, ballistics: Ballistics) -> Self {
        let ballistics = Ballistics::new(ballistics.attack_ms, ballistics.release_ms);
        Self {
            level: 0.0,
            rise: smoothing_coeff(ballistics.attack_ms, sample_rate),
            fall: smoothing_coeff(ballistics.release_ms, sample_rate),
            ballistics,
        }
    }

    /// Recompute the smoothing for `sample_rate` and fall silent.
    pub fn prepare(&mut self, sample_rate: f32) {
        *self = Self::new(sample_rate, self.ballistics);
    }

    /// Track one key sample and return the new level.
    ///
    /// A non-finite key sample reads as silence.
    #[inline]
    pub fn process(&mut self, key: f32) -> f32 {
        let target = if key.is_finite() { key.abs() } else { 0.0 };
        let coeff = if target > self.level { self.rise } else { self.fall };
        self.level = target + coeff * (self.level - target);
        self.level
    }

    /// Level after the last processed sample.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Time constants in use.
    pub fn ballistics(&self) -> Ballistics {
        self.ballistics
    }

    /// Fall silent.
    pub fn reset(&mut self) {
        self.level = 0.0;
    }
}

impl Default for KeyFollower {
    fn default() -> Self {
        Self::new(48000.0, Ballistics::KEY)
    }
}
