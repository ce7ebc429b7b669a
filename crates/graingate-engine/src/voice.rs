//! Grain voices and the fixed-capacity voice pool.
//!
//! A [`VoicePool`] owns a fixed array of [`Voice`]s. Triggering a grain
//! takes the first free voice scanning forward from a rotating cursor.
//! When every voice is busy, the voice with the oldest trigger is stolen.
//! The stolen voice holds the gain its old grain was sounding at and
//! starts the new grain in the same slot; both are rendered under a short
//! linear fade-out, after which the voice goes free. A stolen voice never
//! cuts off abruptly.
//!
//! ```text
//!   Inactive ──trigger──▶ Active ──grain ends──▶ Inactive
//!                           │
//!                         steal
//!                           ▼
//!                         Dying ──fade ends / grain ends──▶ Inactive
//! ```

use graingate_core::{ms_to_samples, sanitize_sample_rate};

use crate::envelope::{EnvelopeGenerator, GrainShape};

/// Default number of voices in a [`VoicePool`].
pub const POOL_CAPACITY: usize = 32;

/// Fade-out time of a stolen voice in milliseconds.
pub const DYING_FADE_MS: f32 = 8.0;

/// Shortest fade-out of a stolen voice, in samples.
pub const MIN_DYING_SAMPLES: u32 = 4;

/// Fade-out length of a stolen voice: `max(4, floor(8 ms * sr))` samples.
///
/// ```rust
/// use graingate_engine::dying_fade_samples;
///
/// assert_eq!(dying_fade_samples(48000.0), 384);
/// assert_eq!(dying_fade_samples(100.0), 4);
/// ```
pub fn dying_fade_samples(sample_rate: f32) -> u32 {
    let samples = ms_to_samples(DYING_FADE_MS, sanitize_sample_rate(sample_rate));
    (samples as u32).max(MIN_DYING_SAMPLES)
}

/// Lifecycle of a voice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoiceState {
    /// Free for allocation, outputs silence.
    #[default]
    Inactive,
    /// Rendering a grain at full gain.
    Active,
    /// Rendering a grain under a fade-out after being stolen.
    Dying,
}

/// One grain-playing voice.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    generator: EnvelopeGenerator,
    state: VoiceState,
    use_input_b: bool,
    dying_counter: u32,
    initial_dying_counter: u32,
    /// Gains of displaced grains on inputs A and B, faded while dying
    held_gain_a: f32,
    held_gain_b: f32,
    /// Trigger timestamp (for voice stealing)
    age: u64,
}

impl Voice {
    /// Create an inactive voice.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            generator: EnvelopeGenerator::new(sample_rate),
            state: VoiceState::Inactive,
            use_input_b: false,
            dying_counter: 0,
            initial_dying_counter: 0,
            held_gain_a: 0.0,
            held_gain_b: 0.0,
            age: 0,
        }
    }

    /// Set the sample rate and return to the initial state.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.generator.prepare(sample_rate);
        self.reset();
    }

    /// Silence the voice and free it.
    pub fn reset(&mut self) {
        self.generator.reset();
        self.state = VoiceState::Inactive;
        self.use_input_b = false;
        self.dying_counter = 0;
        self.initial_dying_counter = 0;
        self.held_gain_a = 0.0;
        self.held_gain_b = 0.0;
        self.age = 0;
    }

    /// Start a grain on a free voice.
    pub fn trigger(&mut self, shape: GrainShape, length: u32, use_input_b: bool, age: u64) {
        self.state = VoiceState::Active;
        self.dying_counter = 0;
        self.initial_dying_counter = 0;
        self.held_gain_a = 0.0;
        self.held_gain_b = 0.0;
        self.start_grain(shape, length, use_input_b, age);
    }

    /// Take over a busy voice.
    ///
    /// The gain the current grain is sounding at is held on its input and
    /// the voice is marked dying. The new grain then starts in the same
    /// slot, and the fade-out scales the held content and the new grain
    /// alike. Stealing a voice that is already dying keeps its fade
    /// position and adds the displaced grain to the held gains.
    pub fn steal(
        &mut self,
        shape: GrainShape,
        length: u32,
        use_input_b: bool,
        age: u64,
        sample_rate: f32,
    ) {
        self.hold_current_grain();
        self.mark_dying(sample_rate);
        self.start_grain(shape, length, use_input_b, age);
    }

    /// Begin the fade-out of an active voice.
    ///
    /// The current grain keeps playing under the fade. Has no effect unless the voice is [`VoiceState::Active`]; a voice
    /// already dying keeps its current fade position.
    pub fn mark_dying(&mut self, sample_rate: f32) {
        if self.state != VoiceState::Active {
            return;
        }
        let fade = dying_fade_samples(sample_rate);
        self.state = VoiceState::Dying;
        self.dying_counter = fade;
        self.initial_dying_counter = fade;
    }

    /// Render one sample from input A or B.
    #[inline]
    pub fn process(&mut self, input_a: f32, input_b: f32) -> f32 {
        if self.state == VoiceState::Inactive {
            return 0.0;
        }

        let input = if self.use_input_b { input_b } else { input_a };
        let out = self.generator.process(input);

        match self.state {
            VoiceState::Active => {
                if !self.generator.is_active() {
                    self.state = VoiceState::Inactive;
                }
                out
            }
            VoiceState::Dying => {
                let fade = self.dying_counter as f32 / self.initial_dying_counter.max(1) as f32;
                let held = self.held_gain_a * input_a + self.held_gain_b * input_b;
                self.dying_counter = self.dying_counter.saturating_sub(1);
                if self.dying_counter == 0 {
                    self.finish();
                }
                (held + out) * fade
            }
            VoiceState::Inactive => 0.0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Whether this voice can take a new grain without stealing.
    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Inactive
    }

    /// Trigger timestamp of the current grain.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Whether the current grain reads input B.
    pub fn uses_input_b(&self) -> bool {
        self.use_input_b
    }

    /// Remaining fade-out samples while dying.
    pub fn dying_counter(&self) -> u32 {
        self.dying_counter
    }

    /// Held gains of displaced grains on inputs A and B.
    pub fn held_gains(&self) -> (f32, f32) {
        (self.held_gain_a, self.held_gain_b)
    }

    /// Fade-out length set when the voice was stolen.
    pub fn initial_dying_counter(&self) -> u32 {
        self.initial_dying_counter
    }

    /// The voice's envelope generator.
    pub fn generator(&self) -> &EnvelopeGenerator {
        &self.generator
    }

    fn start_grain(&mut self, shape: GrainShape, length: u32, use_input_b: bool, age: u64) {
        self.use_input_b = use_input_b;
        self.age = age;
        self.generator.start_new_grain(0, shape, length);
    }

    /// Move the current grain's gain into the held gains. Their sum is
    /// capped at unity so repeated steals of one voice stay bounded.
    fn hold_current_grain(&mut self) {
        let room = (1.0 - self.held_gain_a - self.held_gain_b).max(0.0);
        let gain = self.generator.current_gain().min(room);
        if self.use_input_b {
            self.held_gain_b += gain;
        } else {
            self.held_gain_a += gain;
        }
    }

    fn finish(&mut self) {
        self.generator.reset();
        self.state = VoiceState::Inactive;
        self.dying_counter = 0;
        self.initial_dying_counter = 0;
        self.held_gain_a = 0.0;
        self.held_gain_b = 0.0;
    }
}

/// Result of [`VoicePool::trigger_grain`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A free voice took the grain.
    Allocated(usize),
    /// Every voice was busy; this voice was stolen and is fading out.
    Stolen(usize),
}

impl TriggerOutcome {
    /// Index of the voice that took the grain.
    pub fn voice(self) -> usize {
        match self {
            TriggerOutcome::Allocated(i) | TriggerOutcome::Stolen(i) => i,
        }
    }
}

/// Fixed pool of grain voices with steal-and-fade allocation.
///
/// # Example
///
/// ```rust
/// use graingate_engine::{GrainShape, TriggerOutcome, VoicePool, WindowKind};
///
/// let mut pool: VoicePool<2> = VoicePool::new(48000.0);
/// let shape = GrainShape::Window(WindowKind::Hann);
///
/// assert_eq!(pool.trigger_grain(shape, 4800, false), TriggerOutcome::Allocated(0));
/// assert_eq!(pool.trigger_grain(shape, 4800, false), TriggerOutcome::Allocated(1));
/// // Pool full: the oldest grain's voice is stolen
/// assert_eq!(pool.trigger_grain(shape, 4800, false), TriggerOutcome::Stolen(0));
///
/// let out = pool.process(0.5, 0.0);
/// assert!(out.is_finite());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VoicePool<const N: usize = POOL_CAPACITY> {
    voices: [Voice; N],
    sample_rate: f32,
    /// Next voice to try when allocating
    cursor: usize,
    /// Global trigger counter
    age_counter: u64,
    steal_count: u64,
}

impl<const N: usize> VoicePool<N> {
    /// Create a pool of `N` inactive voices.
    pub fn new(sample_rate: f32) -> Self {
        const { assert!(N > 0, "voice pool needs at least one voice") };
        let sample_rate = sanitize_sample_rate(sample_rate);
        Self {
            voices: core::array::from_fn(|_| Voice::new(sample_rate)),
            sample_rate,
            cursor: 0,
            age_counter: 0,
            steal_count: 0,
        }
    }

    /// Set the sample rate of every voice and return to the initial state.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        for voice in &mut self.voices {
            voice.prepare(self.sample_rate);
        }
        self.cursor = 0;
        self.age_counter = 0;
        self.steal_count = 0;
    }

    /// Free every voice and rewind the allocation cursor.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
        self.cursor = 0;
        self.age_counter = 0;
        self.steal_count = 0;
    }

    /// Start a grain of `length` samples reading input B when `use_input_b`.
    ///
    /// Takes the first free voice at or after the cursor. With none free the
    /// voice holding the oldest grain is stolen and fades out over
    /// [`dying_fade_samples`]. The victim is chosen by trigger timestamp, so
    /// it need not be the voice at the cursor. Either way the cursor moves
    /// past the chosen voice.
    pub fn trigger_grain(&mut self, shape: GrainShape, length: u32, use_input_b: bool) -> TriggerOutcome {
        self.age_counter += 1;
        let age = self.age_counter;

        let outcome = match self.find_free() {
            Some(idx) => {
                self.voices[idx].trigger(shape, length, use_input_b, age);
                TriggerOutcome::Allocated(idx)
            }
            None => {
                let idx = self.oldest();
                self.voices[idx].steal(shape, length, use_input_b, age, self.sample_rate);
                self.steal_count += 1;

                #[cfg(feature = "tracing")]
                tracing::trace!(voice = idx, steals = self.steal_count, "voice stolen");

                TriggerOutcome::Stolen(idx)
            }
        };

        self.cursor = (outcome.voice() + 1) % N;
        outcome
    }

    /// Sum of every voice for one sample of inputs A and B.
    #[inline]
    pub fn process(&mut self, input_a: f32, input_b: f32) -> f32 {
        let mut output = 0.0;
        for voice in &mut self.voices {
            output += voice.process(input_a, input_b);
        }
        output
    }

    /// Number of voices.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Number of voices that are not free.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_free()).count()
    }

    /// Number of voices fading out after a steal.
    pub fn dying_voice_count(&self) -> usize {
        self.voices
            .iter()
            .filter(|v| v.state() == VoiceState::Dying)
            .count()
    }

    /// Total steals since the last reset.
    pub fn steal_count(&self) -> u64 {
        self.steal_count
    }

    /// Allocation cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Sample rate the pool was prepared with.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Read access to all voices.
    pub fn voices(&self) -> &[Voice; N] {
        &self.voices
    }

    fn find_free(&self) -> Option<usize> {
        (0..N)
            .map(|k| (self.cursor + k) % N)
            .find(|&i| self.voices[i].is_free())
    }

    fn oldest(&self) -> usize {
        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.age())
            .map(|(i, _)| i)
            .unwrap_or(self.cursor)
    }
}

impl Default for VoicePool<POOL_CAPACITY> {
    fn default() -> Self {
        Self::new(48000.0)
    }
}
