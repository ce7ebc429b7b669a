//! Looping randomization gate.
//!
//! [`RandomGate`] decides, sample by sample, whether to invert the
//! detector's open/closed decision. It keeps a one-hot
//! loop buffer: the single hot slot comes round once per loop, and the
//! loop shortens as randomness rises, so high randomness flips often
//! and low randomness rarely.
//!
//! | randomness | loop length | flip chance on hot slot |
//! |------------|-------------|----------------------------|
//! | 0.0 | `sr` samples | 0 |
//! | 0.5 | `sr / 2` | ~0.354 |
//! | 1.0 | 1 sample | 1 |
//!
//! Each gate owns its own seeded [`SmallRng`], so two gates never share
//! hidden state. Hosts hand out seeds with a [`SeedSequence`].

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use libm::{powf, roundf};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// First seed handed out by [`SeedSequence::default`].
pub const DEFAULT_SEED: u64 = 12345;

/// Exponent applied to randomness before it becomes a flip probability.
const RANDOMNESS_CURVE: f32 = 1.5;

/// Monotonic source of per-gate seeds.
///
/// Instances created from the same sequence state get distinct seeds;
/// restarting the sequence reproduces them.
///
/// ```rust
/// use graingate_engine::{SeedSequence, DEFAULT_SEED};
///
/// let mut seeds = SeedSequence::default();
/// assert_eq!(seeds.next_seed(), DEFAULT_SEED);
/// assert_eq!(seeds.next_seed(), DEFAULT_SEED + 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSequence {
    next: u64,
}

impl SeedSequence {
    /// Start a sequence at `first`.
    pub const fn new(first: u64) -> Self {
        Self { next: first }
    }

    /// Take the next seed.
    pub fn next_seed(&mut self) -> u64 {
        let seed = self.next;
        self.next = self.next.wrapping_add(1);
        seed
    }
}

impl Default for SeedSequence {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

/// Randomly inverts a gate decision on a looping schedule.
///
/// # Example
///
/// ```rust
/// use graingate_engine::RandomGate;
///
/// let mut gate = RandomGate::new(48000.0, 7);
///
/// // No randomness: the detector decision always passes through
/// assert!(gate.possibly_flip(true));
/// assert!(!gate.possibly_flip(false));
///
/// // Full randomness: every sample is a hot slot and always flips
/// gate.set_randomness(1.0);
/// assert_eq!(gate.loop_length(), 1);
/// assert!(!gate.possibly_flip(true));
/// ```
#[derive(Debug, Clone)]
pub struct RandomGate {
    buffer: Vec<bool>,
    cursor: usize,
    loop_length: usize,
    randomness: f32,
    seed: u64,
    rng: SmallRng,
}

impl RandomGate {
    /// Create a gate for `sample_rate` seeded with `seed`.
    pub fn new(sample_rate: f32, seed: u64) -> Self {
        let mut gate = Self {
            buffer: Vec::new(),
            cursor: 0,
            loop_length: 1,
            randomness: 0.0,
            seed,
            rng: SmallRng::seed_from_u64(seed),
        };
        gate.set_sample_rate(sample_rate);
        gate
    }

    /// Resize the loop buffer to one second at `sample_rate`.
    ///
    /// Rates below 1 Hz are treated as 1 Hz. The cursor rewinds and the
    /// loop length is recomputed for the current randomness.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let size = buffer_size(sample_rate);
        self.buffer = vec![false; size];
        self.buffer[0] = true;
        self.cursor = 0;
        self.update_loop_length();

        #[cfg(feature = "tracing")]
        tracing::debug!(size, "random gate buffer resized");
    }

    /// Set randomness, clamped to `[0, 1]` (NaN reads as 0).
    pub fn set_randomness(&mut self, randomness: f32) {
        self.randomness = if randomness.is_nan() {
            0.0
        } else {
            randomness.clamp(0.0, 1.0)
        };
        self.update_loop_length();
    }

    /// Current randomness.
    pub fn randomness(&self) -> f32 {
        self.randomness
    }

    /// Samples per loop: `max(1, floor(sr * (1 - randomness)))`.
    pub fn loop_length(&self) -> usize {
        self.loop_length
    }

    /// Loop cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Seed this gate was last seeded with.
    pub fn seed_value(&self) -> u64 {
        self.seed
    }

    /// Read the slot under the cursor, then advance the cursor around the loop.
    ///
    /// After the loop shrinks the cursor may sit past its end. That slot is
    /// still read, and the advance wraps modulo the new loop length.
    #[inline]
    pub fn should_randomize_this_sample(&mut self) -> bool {
        let hot = self.buffer.get(self.cursor).copied().unwrap_or(false);
        self.cursor = (self.cursor + 1) % self.loop_length.max(1);
        hot
    }

    /// Return `current`, inverted with probability `randomness^1.5` on a
    /// hot slot.
    #[inline]
    pub fn possibly_flip(&mut self, current: bool) -> bool {
        if !self.should_randomize_this_sample() {
            return current;
        }
        let chance = powf(self.randomness, RANDOMNESS_CURVE);
        let flip = self.rng.random::<f32>() < chance;
        current != flip
    }

    /// Rewind the loop cursor. The random sequence continues.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Restart the random sequence from `seed`.
    pub fn seed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);

        #[cfg(feature = "tracing")]
        tracing::debug!(seed, "random gate reseeded");
    }

    /// Restart the random sequence from the stored seed.
    pub fn reseed(&mut self) {
        self.seed(self.seed);
    }

    fn update_loop_length(&mut self) {
        let len = (self.buffer.len() as f32 * (1.0 - self.randomness)) as usize;
        self.loop_length = len.clamp(1, self.buffer.len().max(1));
    }
}

fn buffer_size(sample_rate: f32) -> usize {
    if sample_rate.is_finite() && sample_rate >= 1.0 {
        roundf(sample_rate) as usize
    } else {
        1
    }
}
