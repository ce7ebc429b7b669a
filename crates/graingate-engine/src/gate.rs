//! Stereo granular noise gate.
//!
//! [`GrainGate`] ties the pieces together. Each channel lane owns a voice
//! pool, a trigger detector, a random gate and a scheduler. Per sample:
//!
//! 1. The detector listens to the key (input B) and reports open/closed.
//! 2. The random gate may invert that decision on its hot slot.
//! 3. The scheduler decides whether a grain starts, on edges and hops or on
//!    grid points.
//! 4. A started grain picks input A or B by crossfade and is handed to the
//!    pool, which renders every voice.
//!
//! With stereo correlation on, the left lane decides from the mid of the
//! key and both pools receive identical triggers. With it off, each lane
//! decides on its own key channel with its own random sequence.

use graingate_core::{TempoManager, Timebase, mono_sum, sanitize_sample_rate};

use crate::detector::TriggerDetector;
use crate::envelope::GrainShape;
use crate::params::{GrainGateParams, Transport};
use crate::random_gate::{RandomGate, SeedSequence};
use crate::scheduler::GrainScheduler;
use crate::voice::VoicePool;

#[derive(Debug, Clone)]
struct Lane {
    pool: VoicePool,
    detector: TriggerDetector,
    random: RandomGate,
    scheduler: GrainScheduler,
}

impl Lane {
    fn new(sample_rate: f32, params: &GrainGateParams, seed: u64) -> Self {
        let mut random = RandomGate::new(sample_rate, seed);
        random.set_randomness(params.randomness);
        Self {
            pool: VoicePool::new(sample_rate),
            detector: TriggerDetector::new(sample_rate, params.threshold_db),
            random,
            scheduler: GrainScheduler::new(),
        }
    }

    /// Open/closed decision for this sample, after randomization.
    #[inline]
    fn decide(&mut self, key: f32) -> bool {
        let detected = self.detector.process(key);
        self.random.possibly_flip(detected)
    }

    fn reset(&mut self) {
        self.pool.reset();
        self.detector.reset();
        self.random.reset();
        self.random.reseed();
        self.scheduler.reset();
    }
}

/// Stereo granular noise gate.
///
/// # Example
///
/// ```rust
/// use graingate_engine::{GrainGate, GrainGateParams, SeedSequence};
///
/// let mut seeds = SeedSequence::default();
/// let mut gate = GrainGate::new(48000.0, &mut seeds);
/// gate.set_params(&GrainGateParams {
///     threshold_db: -30.0,
///     lock_to_grid: false,
///     ..GrainGateParams::default()
/// });
///
/// // A loud key opens the gate and grains start rendering input A
/// let mut peak = 0.0f32;
/// for _ in 0..4800 {
///     let (l, _r) = gate.process_stereo(0.5, 0.5, 0.5, 0.5);
///     peak = peak.max(l.abs());
/// }
/// assert!(gate.grains_triggered() > 0);
/// assert!(peak > 0.1);
/// ```
#[derive(Debug, Clone)]
pub struct GrainGate {
    sample_rate: f32,
    params: GrainGateParams,
    tempo: TempoManager,
    lanes: [Lane; 2],
    shape: GrainShape,
    grain_length: u32,
    hop: u32,
    hop_beats: f64,
    sample_counter: u64,
    grains_triggered: u64,
}

impl GrainGate {
    /// Create a gate with default parameters, taking one seed per channel
    /// from `seeds`.
    pub fn new(sample_rate: f32, seeds: &mut SeedSequence) -> Self {
        let sample_rate = sanitize_sample_rate(sample_rate);
        let params = GrainGateParams::default();
        let lanes = [
            Lane::new(sample_rate, &params, seeds.next_seed()),
            Lane::new(sample_rate, &params, seeds.next_seed()),
        ];
        let mut gate = Self {
            sample_rate,
            params,
            tempo: TempoManager::new(sample_rate, Transport::default().bpm),
            lanes,
            shape: GrainShape::default(),
            grain_length: 1,
            hop: 1,
            hop_beats: 0.0,
            sample_counter: 0,
            grains_triggered: 0,
        };
        gate.update_grain_timing();
        gate
    }

    /// Set the sample rate and return to the initial state.
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        self.tempo.set_sample_rate(self.sample_rate);
        for lane in &mut self.lanes {
            lane.pool.prepare(self.sample_rate);
            lane.detector.prepare(self.sample_rate);
            lane.random.set_sample_rate(self.sample_rate);
        }
        self.update_grain_timing();
        self.reset();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sample_rate = self.sample_rate,
            grain_length = self.grain_length,
            "grain gate prepared"
        );
    }

    /// Silence every voice, rewind the transport position and restart the
    /// random sequences from their original seeds.
    pub fn reset(&mut self) {
        for lane in &mut self.lanes {
            lane.reset();
        }
        self.tempo.reset();
        self.sample_counter = 0;
        self.grains_triggered = 0;
    }

    /// Apply a parameter snapshot. Values are clamped.
    pub fn set_params(&mut self, params: &GrainGateParams) {
        self.params = params.sanitized();
        for lane in &mut self.lanes {
            lane.detector.set_threshold_db(self.params.threshold_db);
            lane.random.set_randomness(self.params.randomness);
        }
        self.update_grain_timing();
    }

    /// Current (clamped) parameters.
    pub fn params(&self) -> &GrainGateParams {
        &self.params
    }

    /// Apply the host transport for the coming block.
    pub fn set_transport(&mut self, transport: Transport) {
        self.tempo.set_bpm(transport.bpm);
        if transport.playing {
            self.tempo.play();
        } else {
            self.tempo.stop();
        }
        if let Some(ppq) = transport.ppq {
            self.tempo.sync_to_beats(ppq);
        }
        self.update_grain_timing();
    }

    /// Process one stereo frame of main input A and key/alternate input B.
    #[inline]
    pub fn process_stereo(&mut self, a_l: f32, a_r: f32, b_l: f32, b_r: f32) -> (f32, f32) {
        let grid = self.grid_step();

        if self.params.stereo_correlation {
            let open = self.lanes[0].decide(mono_sum(b_l, b_r));
            // Keep the right detector's envelope current for mode switches
            self.lanes[1].detector.process(b_r);

            if self.lanes[0].scheduler.step(open, self.hop, grid) {
                let use_b = self.lanes[0].scheduler.next_source(self.params.crossfade);
                for lane in &mut self.lanes {
                    lane.pool.trigger_grain(self.shape, self.grain_length, use_b);
                }
                self.grains_triggered += 1;
            }
        } else {
            for (lane, key) in self.lanes.iter_mut().zip([b_l, b_r]) {
                let open = lane.decide(key);
                if lane.scheduler.step(open, self.hop, grid) {
                    let use_b = lane.scheduler.next_source(self.params.crossfade);
                    lane.pool.trigger_grain(self.shape, self.grain_length, use_b);
                    self.grains_triggered += 1;
                }
            }
        }

        let out_l = self.lanes[0].pool.process(a_l, b_l);
        let out_r = self.lanes[1].pool.process(a_r, b_r);
        (out_l, out_r)
    }

    /// Process a block. Every slice must have the same length; extra
    /// samples in longer slices are left untouched.
    pub fn process_block(
        &mut self,
        a_l: &[f32],
        a_r: &[f32],
        b_l: &[f32],
        b_r: &[f32],
        out_l: &mut [f32],
        out_r: &mut [f32],
    ) {
        debug_assert_eq!(a_l.len(), a_r.len());
        debug_assert_eq!(a_l.len(), out_l.len());
        let frames = a_l
            .len()
            .min(a_r.len())
            .min(b_l.len())
            .min(b_r.len())
            .min(out_l.len())
            .min(out_r.len());
        for i in 0..frames {
            let (l, r) = self.process_stereo(a_l[i], a_r[i], b_l[i], b_r[i]);
            out_l[i] = l;
            out_r[i] = r;
        }
    }

    /// Busy voices across both channels.
    pub fn active_voices(&self) -> usize {
        self.lanes.iter().map(|l| l.pool.active_voice_count()).sum()
    }

    /// Grain start decisions since the last reset. A correlated trigger
    /// counts once even though it starts a grain in both pools.
    pub fn grains_triggered(&self) -> u64 {
        self.grains_triggered
    }

    /// Voice steals across both channels since the last reset.
    pub fn steal_count(&self) -> u64 {
        self.lanes.iter().map(|l| l.pool.steal_count()).sum()
    }

    /// Current grain length in samples.
    pub fn grain_length(&self) -> u32 {
        self.grain_length
    }

    /// Samples between free-running grain starts.
    pub fn hop(&self) -> u32 {
        self.hop
    }

    /// Sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Left and right voice pools.
    pub fn pools(&self) -> [&VoicePool; 2] {
        [&self.lanes[0].pool, &self.lanes[1].pool]
    }

    /// Seeds of the left and right random gates.
    pub fn seeds(&self) -> [u64; 2] {
        [self.lanes[0].random.seed_value(), self.lanes[1].random.seed_value()]
    }

    fn update_grain_timing(&mut self) {
        self.shape = self.params.grain_shape();
        self.grain_length = self
            .params
            .grain_length_samples(self.tempo.bpm(), self.sample_rate);
        self.hop = (self.grain_length / 2).max(1);
        self.hop_beats = f64::from(self.params.division().beats) / 2.0;
    }

    /// Advance the transport and sample clock one step. Returns the grid
    /// crossing when locked to the grid, `None` when free-running.
    #[inline]
    fn grid_step(&mut self) -> Option<bool> {
        let synced = self.params.timebase == Timebase::Beats && self.tempo.is_playing();
        let crossed = if synced {
            self.tempo.advance_and_cross(self.hop_beats)
        } else {
            self.tempo.advance();
            self.sample_counter % u64::from(self.hop) == 0
        };
        self.sample_counter += 1;
        self.params.lock_to_grid.then_some(crossed)
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;
    use crate::params::ShapeSelect;
    use crate::voice::POOL_CAPACITY;

    fn gate_with(params: GrainGateParams) -> GrainGate {
        let mut gate = GrainGate::new(48000.0, &mut SeedSequence::default());
        gate.set_params(&params);
        gate
    }

    fn free_running() -> GrainGateParams {
        GrainGateParams {
            lock_to_grid: false,
            threshold_db: -40.0,
            ..GrainGateParams::default()
        }
    }

    #[test]
    fn test_silent_key_stays_silent() {
        let mut gate = gate_with(free_running());
        for _ in 0..48000 {
            let (l, r) = gate.process_stereo(1.0, 1.0, 0.0, 0.0);
            assert_eq!((l, r), (0.0, 0.0));
        }
        assert_eq!(gate.grains_triggered(), 0);
    }

    #[test]
    fn test_loud_key_triggers_at_hop_rate() {
        let mut gate = gate_with(free_running());
        // 50 ms grains at 48 kHz: 2400 samples, hop 1200
        assert_eq!(gate.grain_length(), 2400);
        assert_eq!(gate.hop(), 1200);

        for _ in 0..48000 {
            gate.process_stereo(0.5, 0.5, 0.5, 0.5);
        }
        let grains = gate.grains_triggered();
        assert!((39..=41).contains(&grains), "got {} grains", grains);
        assert!(gate.active_voices() <= 2 * POOL_CAPACITY);
        assert_eq!(gate.steal_count(), 0, "two overlapping grains never exhaust the pool");
    }

    #[test]
    fn test_overlapping_hann_grains_sum_near_unity() {
        let mut gate = gate_with(free_running());
        let mut out = Vec::new();
        for _ in 0..24000 {
            out.push(gate.process_stereo(1.0, 1.0, 1.0, 1.0).0);
        }
        // Steady state: two Hann grains at half overlap
        let tail = &out[12000..];
        let max = tail.iter().copied().fold(0.0f32, f32::max);
        let min = tail.iter().copied().fold(f32::MAX, f32::min);
        assert!(max < 1.05, "max {}", max);
        assert!(min > 0.95, "min {}", min);
    }

    #[test]
    fn test_correlated_channels_match() {
        let mut gate = gate_with(free_running());
        for i in 0..9600 {
            let key = if (i / 2400) % 2 == 0 { 0.5 } else { 0.0 };
            let (l, r) = gate.process_stereo(0.3, 0.3, key, key * 0.2);
            assert_eq!(l, r, "sample {}", i);
        }
    }

    #[test]
    fn test_decorrelated_channels_follow_own_key() {
        let mut gate = gate_with(GrainGateParams {
            stereo_correlation: false,
            ..free_running()
        });
        let mut right_energy = 0.0;
        let mut left_energy = 0.0;
        for _ in 0..9600 {
            let (l, r) = gate.process_stereo(0.5, 0.5, 0.5, 0.0);
            left_energy += l * l;
            right_energy += r * r;
        }
        assert!(left_energy > 0.0);
        assert_eq!(right_energy, 0.0);
    }

    #[test]
    fn test_crossfade_selects_input_b() {
        let mut gate = gate_with(GrainGateParams {
            crossfade: 1.0,
            shape: ShapeSelect::Rectangular,
            ..free_running()
        });
        // A is silent, B is the key: only B grains make sound
        let mut peak = 0.0f32;
        for _ in 0..4800 {
            peak = peak.max(gate.process_stereo(0.0, 0.0, 0.5, 0.5).0);
        }
        assert!(peak > 0.4);

        let mut gate = gate_with(GrainGateParams {
            crossfade: 0.0,
            ..free_running()
        });
        for _ in 0..4800 {
            assert_eq!(gate.process_stereo(0.0, 0.0, 0.5, 0.5).0, 0.0);
        }
    }

    #[test]
    fn test_locked_free_grid_waits_for_grid_point() {
        let mut gate = gate_with(GrainGateParams {
            lock_to_grid: true,
            ..free_running()
        });
        let hop = gate.hop() as usize;
        let mut first = None;
        for i in 0..(hop * 3) {
            // Key arrives between grid points
            let key = if i >= 100 { 0.5 } else { 0.0 };
            gate.process_stereo(0.5, 0.5, key, key);
            if first.is_none() && gate.grains_triggered() > 0 {
                first = Some(i);
            }
        }
        assert_eq!(first, Some(hop));
    }

    #[test]
    fn test_beat_grid_follows_transport() {
        let mut gate = GrainGate::new(1000.0, &mut SeedSequence::default());
        gate.set_params(&GrainGateParams {
            timebase: Timebase::Beats,
            beat_division: 5, // 1/4
            lock_to_grid: true,
            ..free_running()
        });
        gate.set_transport(Transport {
            bpm: 60.0,
            ppq: Some(0.0),
            playing: true,
        });
        // 1/4 at 60 BPM and 1 kHz: 1000-sample grains, grid every half beat
        assert_eq!(gate.grain_length(), 1000);
        for _ in 0..3800 {
            gate.process_stereo(0.5, 0.5, 0.5, 0.5);
        }
        // Half-beat grid points at beats 0.0, 0.5, ..., 3.5
        assert_eq!(gate.grains_triggered(), 8);
    }

    #[test]
    fn test_stopped_transport_falls_back_to_sample_grid() {
        let mut gate = GrainGate::new(1000.0, &mut SeedSequence::default());
        gate.set_params(&GrainGateParams {
            timebase: Timebase::Beats,
            beat_division: 5,
            lock_to_grid: true,
            ..free_running()
        });
        gate.set_transport(Transport {
            bpm: 60.0,
            ppq: None,
            playing: false,
        });
        for _ in 0..3800 {
            gate.process_stereo(0.5, 0.5, 0.5, 0.5);
        }
        assert_eq!(gate.hop(), 500);
        assert_eq!(gate.grains_triggered(), 8);
    }

    #[test]
    fn test_full_randomness_inverts_decision() {
        let mut gate = gate_with(GrainGateParams {
            randomness: 1.0,
            ..free_running()
        });
        // Silent key, but every sample is flipped open
        for _ in 0..4800 {
            gate.process_stereo(0.5, 0.5, 0.0, 0.0);
        }
        assert!(gate.grains_triggered() > 0);
    }

    #[test]
    fn test_reset_reproduces_output() {
        let params = GrainGateParams {
            randomness: 0.7,
            stereo_correlation: false,
            shape: ShapeSelect::Adsr,
            ..free_running()
        };
        let mut gate = gate_with(params);

        let render = |gate: &mut GrainGate| -> Vec<(f32, f32)> {
            (0..20000)
                .map(|i| {
                    let x = if (i / 700) % 3 == 0 { 0.4 } else { 0.01 };
                    gate.process_stereo(x, -x, x, x * 0.5)
                })
                .collect()
        };

        let first = render(&mut gate);
        gate.reset();
        let second = render(&mut gate);
        assert_eq!(first, second);

        gate.prepare(48000.0);
        let third = render(&mut gate);
        assert_eq!(first, third);
    }

    #[test]
    fn test_seeds_taken_from_sequence() {
        let mut seeds = SeedSequence::new(100);
        let a = GrainGate::new(48000.0, &mut seeds);
        let b = GrainGate::new(48000.0, &mut seeds);
        assert_eq!(a.seeds(), [100, 101]);
        assert_eq!(b.seeds(), [102, 103]);
    }

    #[test]
    fn test_process_block_matches_per_sample() {
        let params = free_running();
        let mut per_sample = gate_with(params);
        let mut block = gate_with(params);

        let input: Vec<f32> = (0..4096).map(|i| if i % 1000 < 600 { 0.5 } else { 0.0 }).collect();
        let expected: Vec<(f32, f32)> = input
            .iter()
            .map(|&x| per_sample.process_stereo(x, x, x, x))
            .collect();

        let mut out_l = vec![0.0; input.len()];
        let mut out_r = vec![0.0; input.len()];
        for start in (0..input.len()).step_by(256) {
            let end = start + 256;
            let s = &input[start..end];
            block.process_block(s, s, s, s, &mut out_l[start..end], &mut out_r[start..end]);
        }
        for (i, &(l, r)) in expected.iter().enumerate() {
            assert_eq!(out_l[i], l);
            assert_eq!(out_r[i], r);
        }
    }

    #[test]
    fn test_invalid_sample_rate_clamped() {
        let mut gate = GrainGate::new(0.0, &mut SeedSequence::default());
        assert_eq!(gate.sample_rate(), 1.0);
        let (l, r) = gate.process_stereo(1.0, 1.0, 1.0, 1.0);
        assert!(l.is_finite() && r.is_finite());
        gate.prepare(f32::NAN);
        assert_eq!(gate.sample_rate(), 1.0);
    }
}
