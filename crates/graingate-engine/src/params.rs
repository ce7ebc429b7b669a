//! Parameter snapshot and host transport.
//!
//! [`GrainGateParams`] is a plain `Copy` value holding every user-facing
//! setting. A host builds one per block and hands it to
//! [`GrainGate::set_params`](crate::GrainGate::set_params); every field is
//! clamped on the way in.
//!
//! ## Parameter Indices (`ParameterInfo`)
//!
//! | Index | Name | Range | Default |
//! |-------|------|-------|---------|
//! | 0 | Shape | 0–5 (Hann … ADSR) | 0 |
//! | 1 | Grain Size | 0.5–2000.0 ms | 50.0 |
//! | 2 | Attack | 1.0–50.0 ms | 2.0 |
//! | 3 | Decay | 1.0–100.0 ms | 10.0 |
//! | 4 | Sustain | 0.0–1.0 | 0.8 |
//! | 5 | Release | 1.0–250.0 ms | 20.0 |
//! | 6 | Randomness | 0.0–1.0 | 0.0 |
//! | 7 | Beat Division | 0–19 | 11 (1/16) |
//! | 8 | Timebase | 0 = ms, 1 = beats | 0 |
//! | 9 | Lock To Grid | toggle | on |
//! | 10 | Stereo Correlation | toggle | on |
//! | 11 | Crossfade | 0.0–1.0 | 0.0 |
//! | 12 | Threshold | -80.0–0.0 dB | -40.0 |

use core::str::FromStr;

use graingate_core::{
    BEAT_DIVISIONS, BeatDivision, DEFAULT_BPM, DEFAULT_DIVISION_INDEX, ParamDescriptor, ParamId,
    ParamScale, ParameterInfo, ParseError, Timebase, clamp_bpm, grain_length_samples,
};

use crate::envelope::{AdsrParams, GrainShape};
use crate::window::WindowKind;

/// Shape selector as exposed to users: the five windows plus ADSR.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShapeSelect {
    /// Hann window.
    #[default]
    Hann,
    /// Triangle window.
    Triangle,
    /// Blackman window.
    Blackman,
    /// Rectangular window.
    Rectangular,
    /// Exponential window.
    Exponential,
    /// ADSR envelope using the attack/decay/sustain/release settings.
    Adsr,
}

impl ShapeSelect {
    /// All selectors in parameter-index order.
    pub const ALL: [ShapeSelect; 6] = [
        ShapeSelect::Hann,
        ShapeSelect::Triangle,
        ShapeSelect::Blackman,
        ShapeSelect::Rectangular,
        ShapeSelect::Exponential,
        ShapeSelect::Adsr,
    ];

    /// Selector at `index`, clamped to the last entry.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// Parameter index of this selector.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lower-case name.
    pub const fn name(self) -> &'static str {
        match self {
            ShapeSelect::Hann => "hann",
            ShapeSelect::Triangle => "triangle",
            ShapeSelect::Blackman => "blackman",
            ShapeSelect::Rectangular => "rectangular",
            ShapeSelect::Exponential => "exponential",
            ShapeSelect::Adsr => "adsr",
        }
    }

    /// Window kind, or `None` for ADSR.
    pub fn window(self) -> Option<WindowKind> {
        match self {
            ShapeSelect::Hann => Some(WindowKind::Hann),
            ShapeSelect::Triangle => Some(WindowKind::Triangle),
            ShapeSelect::Blackman => Some(WindowKind::Blackman),
            ShapeSelect::Rectangular => Some(WindowKind::Rectangular),
            ShapeSelect::Exponential => Some(WindowKind::Exponential),
            ShapeSelect::Adsr => None,
        }
    }

    /// Grain shape for this selector, using `adsr` when it selects ADSR.
    pub fn grain_shape(self, adsr: AdsrParams) -> GrainShape {
        match self.window() {
            Some(kind) => GrainShape::Window(kind),
            None => GrainShape::Adsr(adsr),
        }
    }
}

impl From<WindowKind> for ShapeSelect {
    fn from(kind: WindowKind) -> Self {
        match kind {
            WindowKind::Hann => ShapeSelect::Hann,
            WindowKind::Triangle => ShapeSelect::Triangle,
            WindowKind::Blackman => ShapeSelect::Blackman,
            WindowKind::Rectangular => ShapeSelect::Rectangular,
            WindowKind::Exponential => ShapeSelect::Exponential,
        }
    }
}

impl FromStr for ShapeSelect {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("adsr") {
            return Ok(ShapeSelect::Adsr);
        }
        s.parse::<WindowKind>().map(ShapeSelect::from)
    }
}

/// Host transport snapshot, delivered once per block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transport {
    /// Tempo in BPM, clamped to 20–999 when applied.
    pub bpm: f32,
    /// Host position in quarter notes, if the host reports one.
    pub ppq: Option<f64>,
    /// Whether the host transport is running.
    pub playing: bool,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            ppq: None,
            playing: false,
        }
    }
}

/// Parameter index constants.
pub mod index {
    /// Shape selector.
    pub const SHAPE: usize = 0;
    /// Grain size in ms.
    pub const GRAIN_MS: usize = 1;
    /// ADSR attack.
    pub const ATTACK_MS: usize = 2;
    /// ADSR decay.
    pub const DECAY_MS: usize = 3;
    /// ADSR sustain level.
    pub const SUSTAIN: usize = 4;
    /// ADSR release.
    pub const RELEASE_MS: usize = 5;
    /// Randomness.
    pub const RANDOMNESS: usize = 6;
    /// Beat division index.
    pub const BEAT_DIVISION: usize = 7;
    /// Timebase.
    pub const TIMEBASE: usize = 8;
    /// Lock to grid.
    pub const LOCK_TO_GRID: usize = 9;
    /// Stereo correlation.
    pub const STEREO_CORRELATION: usize = 10;
    /// Crossfade between inputs A and B.
    pub const CROSSFADE: usize = 11;
    /// Detector threshold.
    pub const THRESHOLD_DB: usize = 12;
}

/// Descriptors for every parameter, in index order.
pub const PARAM_DESCRIPTORS: [ParamDescriptor; 13] = [
    ParamDescriptor::choice("Shape", "Shape", ShapeSelect::ALL.len(), 0)
        .with_id(ParamId(1), "shape"),
    ParamDescriptor::time_ms("Grain Size", "Grain", 0.5, 2000.0, 50.0)
        .with_id(ParamId(2), "grain_ms")
        .with_scale(ParamScale::Logarithmic),
    ParamDescriptor::time_ms("Attack", "Attack", 1.0, 50.0, 2.0).with_id(ParamId(3), "attack_ms"),
    ParamDescriptor::time_ms("Decay", "Decay", 1.0, 100.0, 10.0).with_id(ParamId(4), "decay_ms"),
    ParamDescriptor::amount("Sustain", "Sustain", 0.8).with_id(ParamId(5), "sustain"),
    ParamDescriptor::time_ms("Release", "Release", 1.0, 250.0, 20.0)
        .with_id(ParamId(6), "release_ms"),
    ParamDescriptor::amount("Randomness", "Random", 0.0).with_id(ParamId(7), "randomness"),
    ParamDescriptor::choice(
        "Beat Division",
        "Division",
        BEAT_DIVISIONS.len(),
        DEFAULT_DIVISION_INDEX,
    )
    .with_id(ParamId(8), "beat_division"),
    ParamDescriptor::choice("Timebase", "Timebase", 2, 0).with_id(ParamId(9), "timebase"),
    ParamDescriptor::toggle("Lock To Grid", "Lock", true).with_id(ParamId(10), "lock_to_grid"),
    ParamDescriptor::toggle("Stereo Correlation", "Stereo", true)
        .with_id(ParamId(11), "stereo_correlation"),
    ParamDescriptor::amount("Crossfade", "X-Fade", 0.0).with_id(ParamId(12), "crossfade"),
    ParamDescriptor::gain_db("Threshold", "Thresh", -80.0, 0.0, -40.0)
        .with_id(ParamId(13), "threshold_db"),
];

/// Every user-facing setting of the gate.
///
/// # Example
///
/// ```rust
/// use graingate_engine::{GrainGateParams, ShapeSelect};
///
/// let params = GrainGateParams {
///     shape: ShapeSelect::Adsr,
///     grain_ms: 5000.0,
///     ..GrainGateParams::default()
/// }
/// .sanitized();
/// assert_eq!(params.grain_ms, 2000.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrainGateParams {
    /// Grain shape selector.
    pub shape: ShapeSelect,
    /// Grain length in milliseconds (used when `timebase` is milliseconds).
    pub grain_ms: f32,
    /// ADSR attack in ms.
    pub attack_ms: f32,
    /// ADSR decay in ms.
    pub decay_ms: f32,
    /// ADSR sustain level.
    pub sustain: f32,
    /// ADSR release in ms.
    pub release_ms: f32,
    /// Randomization amount.
    pub randomness: f32,
    /// Index into [`BEAT_DIVISIONS`] (used when `timebase` is beats).
    pub beat_division: usize,
    /// Whether grain lengths are in milliseconds or beats.
    pub timebase: Timebase,
    /// Trigger only on grid points instead of on detector edges.
    pub lock_to_grid: bool,
    /// Drive both channels from one decision.
    pub stereo_correlation: bool,
    /// Fraction of grains that render input B.
    pub crossfade: f32,
    /// Detector open threshold in dB.
    pub threshold_db: f32,
}

impl Default for GrainGateParams {
    fn default() -> Self {
        let d = |i: usize| PARAM_DESCRIPTORS[i].default;
        Self {
            shape: ShapeSelect::default(),
            grain_ms: d(index::GRAIN_MS),
            attack_ms: d(index::ATTACK_MS),
            decay_ms: d(index::DECAY_MS),
            sustain: d(index::SUSTAIN),
            release_ms: d(index::RELEASE_MS),
            randomness: d(index::RANDOMNESS),
            beat_division: DEFAULT_DIVISION_INDEX,
            timebase: Timebase::Milliseconds,
            lock_to_grid: true,
            stereo_correlation: true,
            crossfade: d(index::CROSSFADE),
            threshold_db: d(index::THRESHOLD_DB),
        }
    }
}

impl GrainGateParams {
    /// Copy with every field clamped to its descriptor range.
    pub fn sanitized(self) -> Self {
        let c = |i: usize, v: f32| PARAM_DESCRIPTORS[i].clamp(v);
        Self {
            shape: self.shape,
            grain_ms: c(index::GRAIN_MS, self.grain_ms),
            attack_ms: c(index::ATTACK_MS, self.attack_ms),
            decay_ms: c(index::DECAY_MS, self.decay_ms),
            sustain: c(index::SUSTAIN, self.sustain),
            release_ms: c(index::RELEASE_MS, self.release_ms),
            randomness: c(index::RANDOMNESS, self.randomness),
            beat_division: self.beat_division.min(BEAT_DIVISIONS.len() - 1),
            timebase: self.timebase,
            lock_to_grid: self.lock_to_grid,
            stereo_correlation: self.stereo_correlation,
            crossfade: c(index::CROSSFADE, self.crossfade),
            threshold_db: c(index::THRESHOLD_DB, self.threshold_db),
        }
    }

    /// ADSR stage times from the attack/decay/sustain/release fields.
    pub fn adsr(&self) -> AdsrParams {
        AdsrParams::new(self.attack_ms, self.decay_ms, self.sustain, self.release_ms)
    }

    /// Grain shape for the current selector.
    pub fn grain_shape(&self) -> GrainShape {
        self.shape.grain_shape(self.adsr())
    }

    /// Selected beat division.
    pub fn division(&self) -> BeatDivision {
        BeatDivision::from_index(self.beat_division)
    }

    /// Grain length in samples at `bpm` and `sample_rate`.
    pub fn grain_length_samples(&self, bpm: f32, sample_rate: f32) -> u32 {
        grain_length_samples(
            self.timebase,
            self.grain_ms,
            self.division(),
            clamp_bpm(bpm),
            sample_rate,
        )
    }
}

fn flag(on: bool) -> f32 {
    if on { 1.0 } else { 0.0 }
}

impl ParameterInfo for GrainGateParams {
    fn param_count(&self) -> usize {
        PARAM_DESCRIPTORS.len()
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        PARAM_DESCRIPTORS.get(index).copied()
    }

    fn get_param(&self, idx: usize) -> f32 {
        match idx {
            index::SHAPE => self.shape.index() as f32,
            index::GRAIN_MS => self.grain_ms,
            index::ATTACK_MS => self.attack_ms,
            index::DECAY_MS => self.decay_ms,
            index::SUSTAIN => self.sustain,
            index::RELEASE_MS => self.release_ms,
            index::RANDOMNESS => self.randomness,
            index::BEAT_DIVISION => self.beat_division as f32,
            index::TIMEBASE => match self.timebase {
                Timebase::Milliseconds => 0.0,
                Timebase::Beats => 1.0,
            },
            index::LOCK_TO_GRID => flag(self.lock_to_grid),
            index::STEREO_CORRELATION => flag(self.stereo_correlation),
            index::CROSSFADE => self.crossfade,
            index::THRESHOLD_DB => self.threshold_db,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, idx: usize, value: f32) {
        let Some(desc) = PARAM_DESCRIPTORS.get(idx) else {
            return;
        };
        let value = desc.clamp(value);
        match idx {
            index::SHAPE => self.shape = ShapeSelect::from_index(value as usize),
            index::GRAIN_MS => self.grain_ms = value,
            index::ATTACK_MS => self.attack_ms = value,
            index::DECAY_MS => self.decay_ms = value,
            index::SUSTAIN => self.sustain = value,
            index::RELEASE_MS => self.release_ms = value,
            index::RANDOMNESS => self.randomness = value,
            index::BEAT_DIVISION => self.beat_division = value as usize,
            index::TIMEBASE => {
                self.timebase = if value >= 0.5 {
                    Timebase::Beats
                } else {
                    Timebase::Milliseconds
                };
            }
            index::LOCK_TO_GRID => self.lock_to_grid = value >= 0.5,
            index::STEREO_CORRELATION => self.stereo_correlation = value >= 0.5,
            index::CROSSFADE => self.crossfade = value,
            index::THRESHOLD_DB => self.threshold_db = value,
            _ => {}
        }
    }
}
