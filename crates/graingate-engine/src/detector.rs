//! Key-signal trigger detector.
//!
//! Decides whether the gate is open, before randomization. A
//! [`KeyFollower`] with [`Ballistics::KEY`] tracks the key signal; the gate opens when the envelope rises
//! above the threshold and closes once it falls below the threshold minus
//! [`HYSTERESIS_DB`].

use graingate_core::{Ballistics, KeyFollower, db_to_linear};

/// Gap between the open and close thresholds, in dB.
pub const HYSTERESIS_DB: f32 = 3.0;

/// Lowest accepted threshold in dB.
pub const MIN_THRESHOLD_DB: f32 = -80.0;

/// Highest accepted threshold in dB.
pub const MAX_THRESHOLD_DB: f32 = 0.0;

/// Threshold detector with hysteresis.
///
/// # Example
///
/// ```rust
/// use graingate_engine::TriggerDetector;
///
/// let mut detector = TriggerDetector::new(48000.0, -20.0);
/// let mut open = false;
/// for _ in 0..480 {
///     open = detector.process(0.5);
/// }
/// assert!(open);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerDetector {
    follower: KeyFollower,
    threshold_db: f32,
    open_level: f32,
    close_level: f32,
    open: bool,
}

impl TriggerDetector {
    /// Create a closed detector with the given threshold.
    pub fn new(sample_rate: f32, threshold_db: f32) -> Self {
        let mut detector = Self {
            follower: KeyFollower::new(sample_rate, Ballistics::KEY),
            threshold_db: 0.0,
            open_level: 1.0,
            close_level: 1.0,
            open: false,
        };
        detector.set_threshold_db(threshold_db);
        detector
    }

    /// Set the sample rate and close the detector.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.follower.prepare(sample_rate);
        self.open = false;
    }

    /// Set the open threshold in dB (-80 to 0 dB).
    pub fn set_threshold_db(&mut self, threshold_db: f32) {
        let threshold_db = if threshold_db.is_nan() {
            MIN_THRESHOLD_DB
        } else {
            threshold_db.clamp(MIN_THRESHOLD_DB, MAX_THRESHOLD_DB)
        };
        self.threshold_db = threshold_db;
        self.open_level = db_to_linear(threshold_db);
        self.close_level = db_to_linear(threshold_db - HYSTERESIS_DB);
    }

    /// Current open threshold in dB.
    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    /// Feed one key sample and return the open state.
    #[inline]
    pub fn process(&mut self, key: f32) -> bool {
        let level = self.follower.process(key);
        if self.open {
            if level < self.close_level {
                self.open = false;
            }
        } else if level > self.open_level {
            self.open = true;
        }
        self.open
    }

    /// Open state after the last processed sample.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Current envelope level (linear).
    pub fn level(&self) -> f32 {
        self.follower.level()
    }

    /// Clear the envelope and close.
    pub fn reset(&mut self) {
        self.follower.reset();
        self.open = false;
    }
}

impl Default for TriggerDetector {
    fn default() -> Self {
        Self::new(48000.0, -40.0)
    }
}
