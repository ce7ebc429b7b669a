//! Per-grain amplitude envelope.
//!
//! An [`EnvelopeGenerator`] renders one grain at a time. The grain either
//! follows a closed-form [`WindowKind`] over its whole length, or a
//! four-stage ADSR whose stage lengths are fitted into the grain.
//!
//! ## ADSR stages
//!
//! With stage lengths `a`, `d`, `s`, `r` (samples) and sustain level `S`,
//! the gain at position `k` within each stage is:
//!
//! | Stage | Gain |
//! |-------|------|
//! | Attack | `k / a` |
//! | Decay | `1 - (1 - S) k / d` |
//! | Sustain | `S` |
//! | Release | `S (1 - k / r)` |
//!
//! Stage lengths come from `round(ms * sr / 1000)`. Attack, decay and
//! release are each clamped to what is left of the grain, always leaving
//! at least one sample of sustain, so `a + d + s + r` equals the grain
//! length exactly. Zero-length stages are skipped.

use graingate_core::{ms_to_sample_count, sanitize_sample_rate};

use crate::window::WindowKind;

/// Stage times for an ADSR grain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdsrParams {
    /// Attack time in milliseconds.
    pub attack_ms: f32,
    /// Decay time in milliseconds.
    pub decay_ms: f32,
    /// Sustain level in `[0, 1]`.
    pub sustain: f32,
    /// Release time in milliseconds.
    pub release_ms: f32,
}

impl AdsrParams {
    /// Build from stage times and sustain level.
    pub const fn new(attack_ms: f32, decay_ms: f32, sustain: f32, release_ms: f32) -> Self {
        Self {
            attack_ms,
            decay_ms,
            sustain,
            release_ms,
        }
    }

    /// Copy with negative or NaN times zeroed and sustain clamped to `[0, 1]`.
    pub fn sanitized(self) -> Self {
        let time = |ms: f32| if ms.is_nan() { 0.0 } else { ms.max(0.0) };
        let sustain = if self.sustain.is_nan() {
            0.0
        } else {
            self.sustain.clamp(0.0, 1.0)
        };
        Self {
            attack_ms: time(self.attack_ms),
            decay_ms: time(self.decay_ms),
            sustain,
            release_ms: time(self.release_ms),
        }
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self::new(2.0, 10.0, 0.8, 20.0)
    }
}

/// Amplitude shape of a grain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GrainShape {
    /// Closed-form window stretched over the grain.
    Window(WindowKind),
    /// Attack, decay, sustain and release fitted into the grain.
    Adsr(AdsrParams),
}

impl GrainShape {
    /// Short display name.
    pub const fn name(&self) -> &'static str {
        match self {
            GrainShape::Window(kind) => kind.name(),
            GrainShape::Adsr(_) => "adsr",
        }
    }
}

impl Default for GrainShape {
    fn default() -> Self {
        GrainShape::Window(WindowKind::default())
    }
}

impl From<WindowKind> for GrainShape {
    fn from(kind: WindowKind) -> Self {
        GrainShape::Window(kind)
    }
}

impl From<AdsrParams> for GrainShape {
    fn from(params: AdsrParams) -> Self {
        GrainShape::Adsr(params)
    }
}

/// ADSR stage of an envelope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdsrStage {
    /// Not rendering; window grains also report this.
    #[default]
    Idle,
    /// Rising from 0 to 1.
    Attack,
    /// Falling from 1 to the sustain level.
    Decay,
    /// Holding the sustain level.
    Sustain,
    /// Falling from the sustain level to 0.
    Release,
}

impl AdsrStage {
    fn next(self) -> Self {
        match self {
            AdsrStage::Attack => AdsrStage::Decay,
            AdsrStage::Decay => AdsrStage::Sustain,
            AdsrStage::Sustain => AdsrStage::Release,
            AdsrStage::Release | AdsrStage::Idle => AdsrStage::Idle,
        }
    }
}

/// Stage lengths of an ADSR grain, in samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageLengths {
    /// Attack length.
    pub attack: u32,
    /// Decay length.
    pub decay: u32,
    /// Sustain length, at least 1 for a non-empty grain.
    pub sustain: u32,
    /// Release length.
    pub release: u32,
}

impl StageLengths {
    /// Fit `params` into a grain of `total` samples.
    ///
    /// ```rust
    /// use graingate_engine::{AdsrParams, StageLengths};
    ///
    /// let stages = StageLengths::fit(&AdsrParams::new(10.0, 10.0, 0.5, 10.0), 100, 1000.0);
    /// assert_eq!((stages.attack, stages.decay, stages.sustain, stages.release), (10, 10, 70, 10));
    ///
    /// // Stages longer than the grain are squeezed, sustain keeps one sample
    /// let stages = StageLengths::fit(&AdsrParams::new(50.0, 50.0, 0.5, 50.0), 20, 1000.0);
    /// assert_eq!(stages.total(), 20);
    /// assert_eq!(stages.sustain, 1);
    /// ```
    pub fn fit(params: &AdsrParams, total: u32, sample_rate: f32) -> Self {
        if total == 0 {
            return Self::default();
        }
        let mut budget = total - 1;
        let mut take = |ms: f32| {
            let n = ms_to_sample_count(ms, sample_rate, 0, budget);
            budget -= n;
            n
        };
        let attack = take(params.attack_ms);
        let decay = take(params.decay_ms);
        let release = take(params.release_ms);
        Self {
            attack,
            decay,
            sustain: total - attack - decay - release,
            release,
        }
    }

    /// Sum of all four stages.
    pub fn total(&self) -> u32 {
        self.attack + self.decay + self.sustain + self.release
    }

    fn of(&self, stage: AdsrStage) -> u32 {
        match stage {
            AdsrStage::Attack => self.attack,
            AdsrStage::Decay => self.decay,
            AdsrStage::Sustain => self.sustain,
            AdsrStage::Release => self.release,
            AdsrStage::Idle => 0,
        }
    }
}

/// Renders the amplitude envelope of a single grain.
///
/// Every call to [`process`](Self::process) while active yields
/// `input * gain` and advances one sample, the last sample of the grain
/// included. The generator goes inactive once the sample index reaches the
/// grain length, or for ADSR grains once the release completes.
///
/// # Example
///
/// ```rust
/// use graingate_engine::{EnvelopeGenerator, GrainShape, WindowKind};
///
/// let mut env = EnvelopeGenerator::new(48000.0);
/// env.start_new_grain(0, GrainShape::Window(WindowKind::Rectangular), 4);
///
/// let out: Vec<f32> = (0..6).map(|_| env.process(0.5)).collect();
/// assert_eq!(out, [0.5, 0.5, 0.5, 0.5, 0.0, 0.0]);
/// assert!(!env.is_active());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeGenerator {
    sample_rate: f32,
    active: bool,
    shape: GrainShape,
    sample_index: u32,
    length: u32,
    stages: StageLengths,
    stage: AdsrStage,
    stage_position: u32,
    sustain_level: f32,
    /// Gain of the last rendered sample, 0 once the grain has ended
    gain: f32,
}

impl EnvelopeGenerator {
    /// Create an idle generator.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate: sanitize_sample_rate(sample_rate),
            active: false,
            shape: GrainShape::default(),
            sample_index: 0,
            length: 1,
            stages: StageLengths::default(),
            stage: AdsrStage::Idle,
            stage_position: 0,
            sustain_level: 0.0,
            gain: 0.0,
        }
    }

    /// Set the sample rate used for ADSR stage lengths and go idle.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        self.reset();
    }

    /// Stop the current grain.
    pub fn reset(&mut self) {
        self.active = false;
        self.shape = GrainShape::default();
        self.sample_index = 0;
        self.length = 1;
        self.stages = StageLengths::default();
        self.stage = AdsrStage::Idle;
        self.stage_position = 0;
        self.sustain_level = 0.0;
        self.gain = 0.0;
    }

    /// Begin a grain of `length_samples` (minimum 1) starting `offset_samples`
    /// into its window.
    ///
    /// The offset is clamped to the last sample of the grain. ADSR stage
    /// lengths are fitted into the samples remaining after the offset.
    pub fn start_new_grain(&mut self, offset_samples: u32, shape: GrainShape, length_samples: u32) {
        let length = length_samples.max(1);
        self.length = length;
        self.sample_index = offset_samples.min(length - 1);
        self.shape = shape;
        self.active = true;
        self.gain = 0.0;

        match shape {
            GrainShape::Window(_) => {
                self.stages = StageLengths::default();
                self.stage = AdsrStage::Idle;
                self.stage_position = 0;
            }
            GrainShape::Adsr(params) => {
                let params = params.sanitized();
                self.stages = StageLengths::fit(&params, length - self.sample_index, self.sample_rate);
                self.sustain_level = params.sustain;
                self.stage = AdsrStage::Attack;
                self.stage_position = 0;
                self.skip_empty_stages();
            }
        }
    }

    /// Apply the envelope to `input` and advance one sample.
    ///
    /// Returns 0 once the grain has finished.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if !self.active {
            return 0.0;
        }

        let gain = match self.shape {
            GrainShape::Window(kind) => kind.evaluate(self.sample_index, self.length),
            GrainShape::Adsr(_) => self.advance_adsr(),
        };
        self.sample_index += 1;

        let adsr_done = matches!(self.shape, GrainShape::Adsr(_)) && self.stage == AdsrStage::Idle;
        if self.sample_index >= self.length || adsr_done {
            self.active = false;
            self.stage = AdsrStage::Idle;
            self.gain = 0.0;
        } else {
            self.gain = gain;
        }

        input * gain
    }

    /// Gain the grain is sounding at: that of the last rendered sample, or
    /// 0 before the first sample and after the last.
    pub fn current_gain(&self) -> f32 {
        self.gain
    }

    /// Whether a grain is being rendered.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Samples rendered so far, including any start offset.
    pub fn sample_index(&self) -> u32 {
        self.sample_index
    }

    /// Length of the current grain in samples.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Shape of the current grain.
    pub fn shape(&self) -> GrainShape {
        self.shape
    }

    /// Current ADSR stage ([`AdsrStage::Idle`] for window grains).
    pub fn stage(&self) -> AdsrStage {
        self.stage
    }

    /// Fitted ADSR stage lengths of the current grain.
    pub fn stage_lengths(&self) -> StageLengths {
        self.stages
    }

    fn advance_adsr(&mut self) -> f32 {
        let k = self.stage_position as f32;
        let n = self.stages.of(self.stage) as f32;
        let s = self.sustain_level;
        let gain = match self.stage {
            AdsrStage::Attack => k / n,
            AdsrStage::Decay => 1.0 - (1.0 - s) * k / n,
            AdsrStage::Sustain => s,
            AdsrStage::Release => s * (1.0 - k / n),
            AdsrStage::Idle => 0.0,
        };

        self.stage_position += 1;
        if self.stage_position >= self.stages.of(self.stage) {
            self.stage = self.stage.next();
            self.stage_position = 0;
            self.skip_empty_stages();
        }
        gain
    }

    fn skip_empty_stages(&mut self) {
        while self.stage != AdsrStage::Idle && self.stages.of(self.stage) == 0 {
            self.stage = self.stage.next();
        }
    }
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use alloc::vec::Vec;

    use super::*;

    fn render(env: &mut EnvelopeGenerator, n: usize) -> Vec<f32> {
        (0..n).map(|_| env.process(1.0)).collect()
    }

    #[test]
    fn test_idle_outputs_silence() {
        let mut env = EnvelopeGenerator::new(48000.0);
        assert!(!env.is_active());
        assert_eq!(env.process(1.0), 0.0);
    }

    #[test]
    fn test_hann_grain_renders_final_sample() {
        let mut env = EnvelopeGenerator::new(48000.0);
        env.start_new_grain(0, GrainShape::Window(WindowKind::Hann), 5);

        let out = render(&mut env, 5);
        assert!(out[0].abs() < 1e-6);
        assert!((out[2] - 1.0).abs() < 1e-6);
        assert!(out[4].abs() < 1e-6);
        assert!(!env.is_active(), "grain should end after its last sample");
    }

    #[test]
    fn test_offset_starts_mid_window() {
        let mut env = EnvelopeGenerator::new(48000.0);
        env.start_new_grain(2, GrainShape::Window(WindowKind::Triangle), 5);

        let out = render(&mut env, 4);
        assert!((out[0] - 1.0).abs() < 1e-6, "offset 2 of 5 is the peak");
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!(out[2].abs() < 1e-6);
        assert_eq!(out[3], 0.0);
    }

    #[test]
    fn test_offset_clamped_to_last_sample() {
        let mut env = EnvelopeGenerator::new(48000.0);
        env.start_new_grain(99, GrainShape::Window(WindowKind::Rectangular), 3);
        assert_eq!(env.sample_index(), 2);
        assert_eq!(env.process(1.0), 1.0);
        assert!(!env.is_active());
    }

    #[test]
    fn test_zero_length_grain_becomes_one_sample() {
        let mut env = EnvelopeGenerator::new(48000.0);
        env.start_new_grain(0, GrainShape::Window(WindowKind::Hann), 0);
        assert_eq!(env.length(), 1);
        assert!(env.process(1.0) > 0.99);
        assert!(!env.is_active());
    }

    #[test]
    fn test_adsr_stage_regions() {
        let mut env = EnvelopeGenerator::new(1000.0);
        let params = AdsrParams::new(10.0, 10.0, 0.5, 10.0);
        env.start_new_grain(0, GrainShape::Adsr(params), 100);

        let stages = env.stage_lengths();
        assert_eq!(stages.attack, 10);
        assert_eq!(stages.decay, 10);
        assert_eq!(stages.sustain, 70);
        assert_eq!(stages.release, 10);

        let out = render(&mut env, 100);
        assert_eq!(out[0], 0.0);
        assert!((out[5] - 0.5).abs() < 1e-6, "attack midpoint");
        assert!((out[10] - 1.0).abs() < 1e-6, "decay starts at peak");
        assert!((out[15] - 0.75).abs() < 1e-6, "decay midpoint");
        for (i, &g) in out[20..90].iter().enumerate() {
            assert!((g - 0.5).abs() < 1e-6, "sustain sample {} = {}", i + 20, g);
        }
        assert!((out[90] - 0.5).abs() < 1e-6, "release starts at sustain");
        assert!((out[95] - 0.25).abs() < 1e-6);
        assert!(out[99] > 0.0 && out[99] < 0.06);
        assert!(!env.is_active());
        assert_eq!(env.stage(), AdsrStage::Idle);
    }

    #[test]
    fn test_adsr_stage_sequence() {
        let mut env = EnvelopeGenerator::new(1000.0);
        env.start_new_grain(0, GrainShape::Adsr(AdsrParams::new(2.0, 2.0, 0.5, 2.0)), 10);

        let mut seen = Vec::new();
        while env.is_active() {
            let stage = env.stage();
            if seen.last() != Some(&stage) {
                seen.push(stage);
            }
            env.process(1.0);
        }
        assert_eq!(
            seen,
            [AdsrStage::Attack, AdsrStage::Decay, AdsrStage::Sustain, AdsrStage::Release]
        );
    }

    #[test]
    fn test_adsr_squeezed_into_short_grain() {
        let mut env = EnvelopeGenerator::new(1000.0);
        env.start_new_grain(0, GrainShape::Adsr(AdsrParams::new(30.0, 30.0, 0.5, 30.0)), 40);

        let stages = env.stage_lengths();
        assert_eq!(stages.total(), 40);
        assert_eq!(stages.attack, 30);
        assert_eq!(stages.decay, 9);
        assert_eq!(stages.sustain, 1);
        assert_eq!(stages.release, 0);

        let out = render(&mut env, 40);
        assert!(out.iter().all(|&g| (0.0..=1.0).contains(&g)));
        assert!(!env.is_active());
    }

    #[test]
    fn test_adsr_zero_stages_skipped() {
        let mut env = EnvelopeGenerator::new(1000.0);
        env.start_new_grain(0, GrainShape::Adsr(AdsrParams::new(0.0, 0.0, 0.6, 0.0)), 8);
        assert_eq!(env.stage(), AdsrStage::Sustain);

        let out = render(&mut env, 8);
        assert!(out.iter().all(|&g| (g - 0.6).abs() < 1e-6));
        assert!(!env.is_active());
    }

    #[test]
    fn test_adsr_sanitizes_params() {
        let mut env = EnvelopeGenerator::new(1000.0);
        env.start_new_grain(0, GrainShape::Adsr(AdsrParams::new(f32::NAN, -3.0, 7.0, 2.0)), 10);

        let stages = env.stage_lengths();
        assert_eq!(stages.attack, 0);
        assert_eq!(stages.decay, 0);
        assert_eq!(stages.release, 2);
        // sustain clamped to 1.0
        assert!((env.process(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_restart_replaces_grain() {
        let mut env = EnvelopeGenerator::new(48000.0);
        env.start_new_grain(0, GrainShape::Window(WindowKind::Rectangular), 100);
        render(&mut env, 10);
        env.start_new_grain(0, GrainShape::Window(WindowKind::Hann), 3);
        assert_eq!(env.sample_index(), 0);
        assert_eq!(env.length(), 3);
        render(&mut env, 3);
        assert!(!env.is_active());
    }

    #[test]
    fn test_reset_stops_grain() {
        let mut env = EnvelopeGenerator::new(48000.0);
        env.start_new_grain(0, GrainShape::Window(WindowKind::Rectangular), 100);
        env.process(1.0);
        env.reset();
        assert!(!env.is_active());
        assert_eq!(env, EnvelopeGenerator::new(48000.0));
    }

    #[test]
    fn test_current_gain_tracks_last_sample() {
        let mut env = EnvelopeGenerator::new(48000.0);
        env.start_new_grain(0, GrainShape::Window(WindowKind::Triangle), 5);
        assert_eq!(env.current_gain(), 0.0);

        env.process(0.25);
        env.process(0.25);
        assert!((env.current_gain() - 0.5).abs() < 1e-6, "gain does not depend on input");
        render(&mut env, 3);
        assert!(!env.is_active());
        assert_eq!(env.current_gain(), 0.0);
    }
}
