//! Graingate Engine - polyphonic grain voices for a granular noise gate
//!
//! A pool of short, enveloped grains is triggered by a key-signal detector
//! and applied sample by sample to the input. The hard parts live here:
//! real-time voice allocation with graceful stealing, sample-accurate
//! window and ADSR envelopes, and a seeded randomization gate.
//!
//! # Components
//!
//! - [`WindowKind`] - Hann, Triangle, Blackman, Rectangular and Exponential windows
//! - [`EnvelopeGenerator`] / [`GrainShape`] - Per-grain gain, window or ADSR
//! - [`RandomGate`] / [`SeedSequence`] - Looping one-hot randomization
//! - [`VoicePool`] / [`Voice`] - 32 voices with steal-and-fade allocation
//! - [`TriggerDetector`] - Threshold detector with hysteresis
//! - [`GrainScheduler`] - Edge, hop and grid trigger timing
//! - [`GrainGate`] - Stereo processor combining all of the above
//! - [`GrainGateParams`] / [`Transport`] - Per-block settings and tempo
//!
//! # Example
//!
//! ```rust
//! use graingate_engine::{GrainShape, VoicePool, WindowKind};
//!
//! let mut pool: VoicePool = VoicePool::new(48000.0);
//! pool.trigger_grain(GrainShape::Window(WindowKind::Hann), 2400, false);
//!
//! let mut out = [0.0f32; 2400];
//! for sample in out.iter_mut() {
//!     *sample = pool.process(1.0, 0.0);
//! }
//! assert!((out[1200] - 1.0).abs() < 1e-3);
//! assert_eq!(pool.active_voice_count(), 0);
//! ```
//!
//! # no_std Support
//!
//! Disable the default `std` feature. The random gate's loop buffer needs
//! `alloc`; nothing allocates after construction or `prepare`.
//!
//! ```toml
//! [dependencies]
//! graingate-engine = { version = "0.1", default-features = false }
//! ```
//!
//! # Features
//!
//! - `std` (default) - Standard library support
//! - `tracing` - `debug!` on setup paths and `trace!` on voice steals

#![cfg_attr(not(feature = "std"), no_std)]

pub mod detector;
pub mod envelope;
pub mod gate;
pub mod params;
pub mod random_gate;
pub mod scheduler;
pub mod voice;
pub mod window;

pub use detector::{HYSTERESIS_DB, TriggerDetector};
pub use envelope::{AdsrParams, AdsrStage, EnvelopeGenerator, GrainShape, StageLengths};
pub use gate::GrainGate;
pub use params::{GrainGateParams, PARAM_DESCRIPTORS, ShapeSelect, Transport};
pub use random_gate::{DEFAULT_SEED, RandomGate, SeedSequence};
pub use scheduler::GrainScheduler;
pub use voice::{
    DYING_FADE_MS, MIN_DYING_SAMPLES, POOL_CAPACITY, TriggerOutcome, Voice, VoicePool, VoiceState,
    dying_fade_samples,
};
pub use window::WindowKind;

// Re-export commonly used types from graingate-core
pub use graingate_core::{BEAT_DIVISIONS, BeatDivision, ParamDescriptor, ParameterInfo, Timebase};
