//! Musical timing for beat-synced grain lengths.
//!
//! Provides the ordered beat-division table, the ms/beats [`Timebase`]
//! switch, grain-length resolution, and a [`TempoManager`] that tracks
//! transport position and reports grid crossings.

use libm::{ceil, roundf};

use crate::math::{ms_to_samples, sanitize_sample_rate};
use crate::ParseError;

/// Lowest tempo accepted from a host.
pub const MIN_BPM: f32 = 20.0;
/// Highest tempo accepted from a host.
pub const MAX_BPM: f32 = 999.0;
/// Tempo used when the host supplies none.
pub const DEFAULT_BPM: f32 = 120.0;

/// Longest grain, in seconds. Grain lengths are clamped to this.
pub const MAX_GRAIN_SECONDS: f32 = 2.0;

/// One entry of the beat-division table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatDivision {
    /// Note length in beats (quarter note = 1.0).
    pub beats: f32,
    /// Display label, e.g. `"1/16"`, `"1/8D"`, `"1/4T"`.
    pub label: &'static str,
}

/// Ordered table of musical note lengths, straight / dotted / triplet.
pub const BEAT_DIVISIONS: [BeatDivision; 20] = [
    BeatDivision { beats: 4.0, label: "1/1" },
    BeatDivision { beats: 3.0, label: "1/1T" },
    BeatDivision { beats: 2.0, label: "1/2" },
    BeatDivision { beats: 1.5, label: "1/2D" },
    BeatDivision { beats: 4.0 / 3.0, label: "1/2T" },
    BeatDivision { beats: 1.0, label: "1/4" },
    BeatDivision { beats: 0.75, label: "1/4D" },
    BeatDivision { beats: 2.0 / 3.0, label: "1/4T" },
    BeatDivision { beats: 0.5, label: "1/8" },
    BeatDivision { beats: 0.375, label: "1/8D" },
    BeatDivision { beats: 1.0 / 3.0, label: "1/8T" },
    BeatDivision { beats: 0.25, label: "1/16" },
    BeatDivision { beats: 0.1875, label: "1/16D" },
    BeatDivision { beats: 1.0 / 6.0, label: "1/16T" },
    BeatDivision { beats: 0.125, label: "1/32" },
    BeatDivision { beats: 0.09375, label: "1/32D" },
    BeatDivision { beats: 1.0 / 12.0, label: "1/32T" },
    BeatDivision { beats: 0.0625, label: "1/64" },
    BeatDivision { beats: 0.046875, label: "1/64D" },
    BeatDivision { beats: 1.0 / 24.0, label: "1/64T" },
];

/// Index of `"1/16"`, the default division.
pub const DEFAULT_DIVISION_INDEX: usize = 11;

impl BeatDivision {
    /// Look up a division by table index. Out-of-range indices clamp to
    /// the last (shortest) entry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use graingate_core::BeatDivision;
    ///
    /// assert_eq!(BeatDivision::from_index(5).label, "1/4");
    /// assert_eq!(BeatDivision::from_index(999).label, "1/64T");
    /// ```
    pub fn from_index(index: usize) -> Self {
        BEAT_DIVISIONS[index.min(BEAT_DIVISIONS.len() - 1)]
    }

    /// Find the table index for a label (case-insensitive).
    pub fn index_of_label(label: &str) -> Result<usize, ParseError> {
        let label = label.trim();
        BEAT_DIVISIONS
            .iter()
            .position(|d| d.label.eq_ignore_ascii_case(label))
            .ok_or(ParseError::UnknownDivision)
    }

    /// Look up a division by label (case-insensitive).
    pub fn from_label(label: &str) -> Result<Self, ParseError> {
        Self::index_of_label(label).map(Self::from_index)
    }

    /// Duration in milliseconds at the given tempo.
    ///
    /// ```rust
    /// use graingate_core::BeatDivision;
    ///
    /// // At 120 BPM a quarter note lasts 500 ms
    /// let quarter = BeatDivision::from_label("1/4").unwrap();
    /// assert!((quarter.to_ms(120.0) - 500.0).abs() < 0.01);
    /// ```
    pub fn to_ms(&self, bpm: f32) -> f32 {
        self.beats * 60_000.0 / clamp_bpm(bpm)
    }

    /// Duration in (fractional) samples at the given tempo and rate.
    pub fn to_samples(&self, bpm: f32, sample_rate: f32) -> f32 {
        ms_to_samples(self.to_ms(bpm), sample_rate)
    }
}

/// Whether grain lengths are given in milliseconds or follow the tempo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Timebase {
    /// Grain length is `grain_ms`.
    #[default]
    Milliseconds,
    /// Grain length is one beat division at the current tempo.
    Beats,
}

impl core::str::FromStr for Timebase {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("ms") || s.eq_ignore_ascii_case("milliseconds") {
            Ok(Timebase::Milliseconds)
        } else if s.eq_ignore_ascii_case("beats") || s.eq_ignore_ascii_case("beat") {
            Ok(Timebase::Beats)
        } else {
            Err(ParseError::UnknownTimebase)
        }
    }
}

/// Clamp a host tempo to `[MIN_BPM, MAX_BPM]`; NaN maps to the default.
#[inline]
pub fn clamp_bpm(bpm: f32) -> f32 {
    if bpm.is_nan() {
        DEFAULT_BPM
    } else {
        bpm.clamp(MIN_BPM, MAX_BPM)
    }
}

/// Longest grain in samples at a given sample rate (at least 1).
#[inline]
pub fn max_grain_samples(sample_rate: f32) -> u32 {
    (sanitize_sample_rate(sample_rate) * MAX_GRAIN_SECONDS).max(1.0) as u32
}

/// Resolve a grain length in samples.
///
/// - `Milliseconds`: `round(grain_ms * sr / 1000)`
/// - `Beats`: `round(division.beats * 60 / bpm * sr)`
///
/// Both are clamped to `[1, max_grain_samples(sr)]`.
///
/// # Example
///
/// ```rust
/// use graingate_core::{grain_length_samples, BeatDivision, Timebase};
///
/// let sixteenth = BeatDivision::from_label("1/16").unwrap();
/// assert_eq!(grain_length_samples(Timebase::Milliseconds, 50.0, sixteenth, 120.0, 48000.0), 2400);
/// // 1/16 at 120 BPM = 125 ms
/// assert_eq!(grain_length_samples(Timebase::Beats, 50.0, sixteenth, 120.0, 48000.0), 6000);
/// ```
pub fn grain_length_samples(
    timebase: Timebase,
    grain_ms: f32,
    division: BeatDivision,
    bpm: f32,
    sample_rate: f32,
) -> u32 {
    let sample_rate = sanitize_sample_rate(sample_rate);
    let samples = match timebase {
        Timebase::Milliseconds => ms_to_samples(grain_ms, sample_rate),
        Timebase::Beats => division.to_samples(bpm, sample_rate),
    };
    let max = max_grain_samples(sample_rate);
    let samples = roundf(samples);
    if samples.is_nan() || samples < 1.0 {
        1
    } else if samples >= max as f32 {
        max
    } else {
        samples as u32
    }
}

/// Transport state for tempo-synced processing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportState {
    /// Position does not advance.
    #[default]
    Stopped,
    /// Position advances one sample per [`TempoManager::advance`].
    Playing,
}

/// Tracks tempo and transport position and detects grid crossings.
///
/// Position is kept in beats as `f64` so long sessions do not lose
/// sub-sample resolution. A host position (PPQ) can be applied at the
/// start of every block with [`sync_to_beats`](Self::sync_to_beats).
///
/// # Example
///
/// ```rust
/// use graingate_core::TempoManager;
///
/// let mut tempo = TempoManager::new(48000.0, 120.0);
/// tempo.play();
///
/// // 120 BPM at 48 kHz: one beat every 24000 samples
/// let mut crossings = 0;
/// for _ in 0..36000 {
///     if tempo.advance_and_cross(1.0) {
///         crossings += 1;
///     }
/// }
/// assert_eq!(crossings, 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TempoManager {
    bpm: f32,
    sample_rate: f32,
    beats_per_sample: f64,
    beat_position: f64,
    transport: TransportState,
}

impl TempoManager {
    /// Create a new tempo manager, stopped at position zero.
    pub fn new(sample_rate: f32, bpm: f32) -> Self {
        let mut tempo = Self {
            bpm: clamp_bpm(bpm),
            sample_rate: sanitize_sample_rate(sample_rate),
            beats_per_sample: 0.0,
            beat_position: 0.0,
            transport: TransportState::Stopped,
        };
        tempo.recalculate();
        tempo
    }

    /// Set the tempo in BPM (clamped).
    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = clamp_bpm(bpm);
        self.recalculate();
    }

    /// Current tempo in BPM.
    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Set the sample rate (clamped).
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sanitize_sample_rate(sample_rate);
        self.recalculate();
    }

    /// Current sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Start transport.
    pub fn play(&mut self) {
        self.transport = TransportState::Playing;
    }

    /// Stop transport.
    pub fn stop(&mut self) {
        self.transport = TransportState::Stopped;
    }

    /// Current transport state.
    pub fn transport(&self) -> TransportState {
        self.transport
    }

    /// Check if transport is playing.
    pub fn is_playing(&self) -> bool {
        self.transport == TransportState::Playing
    }

    /// Jump to a host-supplied position in beats (PPQ).
    pub fn sync_to_beats(&mut self, ppq: f64) {
        self.beat_position = if ppq.is_finite() { ppq.max(0.0) } else { 0.0 };
    }

    /// Current position in beats.
    pub fn beat_position(&self) -> f64 {
        self.beat_position
    }

    /// Rewind to position zero.
    pub fn reset(&mut self) {
        self.beat_position = 0.0;
    }

    /// Advance by one sample. Only moves while playing.
    pub fn advance(&mut self) {
        if self.is_playing() {
            self.beat_position += self.beats_per_sample;
        }
    }

    /// Advance by one sample and report whether a grid line of
    /// `grid_beats` lies in `[before, after)` for this step.
    ///
    /// A sample starting exactly on a grid line (including position
    /// zero) counts as a crossing. Always `false` when stopped or when
    /// `grid_beats` is not positive.
    pub fn advance_and_cross(&mut self, grid_beats: f64) -> bool {
        if !self.is_playing() || !(grid_beats > 0.0) {
            return false;
        }
        let before = self.beat_position;
        self.beat_position += self.beats_per_sample;
        // first grid line at or after `before`
        let next_line = ceil(before / grid_beats) * grid_beats;
        next_line < self.beat_position
    }

    fn recalculate(&mut self) {
        self.beats_per_sample = f64::from(self.bpm) / 60.0 / f64::from(self.sample_rate);
    }
}

impl Default for TempoManager {
    fn default() -> Self {
        Self::new(48000.0, DEFAULT_BPM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_ordered_longest_first() {
        for pair in BEAT_DIVISIONS.windows(2) {
            assert!(
                pair[0].beats > pair[1].beats,
                "{} should be longer than {}",
                pair[0].label,
                pair[1].label
            );
        }
    }

    #[test]
    fn test_default_division_is_sixteenth() {
        assert_eq!(BeatDivision::from_index(DEFAULT_DIVISION_INDEX).label, "1/16");
    }

    #[test]
    fn test_label_lookup_is_case_insensitive() {
        assert_eq!(BeatDivision::index_of_label("1/8d"), Ok(9));
        assert_eq!(BeatDivision::index_of_label(" 1/4T "), Ok(7));
        assert_eq!(
            BeatDivision::index_of_label("1/3"),
            Err(ParseError::UnknownDivision)
        );
    }

    #[test]
    fn test_division_to_ms() {
        // At 120 BPM: quarter = 500 ms, dotted eighth = 187.5 ms, triplet eighth = 166.67 ms
        assert!((BeatDivision::from_index(5).to_ms(120.0) - 500.0).abs() < 0.01);
        assert!((BeatDivision::from_index(9).to_ms(120.0) - 187.5).abs() < 0.01);
        assert!((BeatDivision::from_index(10).to_ms(120.0) - 166.667).abs() < 0.01);
    }

    #[test]
    fn test_bpm_clamping() {
        assert_eq!(clamp_bpm(0.0), MIN_BPM);
        assert_eq!(clamp_bpm(5000.0), MAX_BPM);
        assert_eq!(clamp_bpm(f32::NAN), DEFAULT_BPM);
    }

    #[test]
    fn test_grain_length_clamps() {
        let div = BeatDivision::from_index(0);
        assert_eq!(grain_length_samples(Timebase::Milliseconds, 0.0, div, 120.0, 48000.0), 1);
        assert_eq!(grain_length_samples(Timebase::Milliseconds, -3.0, div, 120.0, 48000.0), 1);
        assert_eq!(
            grain_length_samples(Timebase::Milliseconds, 60_000.0, div, 120.0, 48000.0),
            96_000
        );
        // whole note at the slowest tempo exceeds two seconds
        assert_eq!(grain_length_samples(Timebase::Beats, 0.0, div, 20.0, 48000.0), 96_000);
    }

    #[test]
    fn test_grain_length_with_bad_sample_rate() {
        let div = BeatDivision::from_index(DEFAULT_DIVISION_INDEX);
        assert_eq!(grain_length_samples(Timebase::Milliseconds, 50.0, div, 120.0, 0.0), 1);
    }

    #[test]
    fn test_tempo_stopped_does_not_move() {
        let mut tempo = TempoManager::new(48000.0, 120.0);
        for _ in 0..1000 {
            tempo.advance();
            assert!(!tempo.advance_and_cross(0.25));
        }
        assert_eq!(tempo.beat_position(), 0.0);
    }

    #[test]
    fn test_tempo_position() {
        let mut tempo = TempoManager::new(48000.0, 120.0);
        tempo.play();
        for _ in 0..24000 {
            tempo.advance();
        }
        assert!((tempo.beat_position() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_grid_crossings_from_synced_position() {
        let mut tempo = TempoManager::new(1000.0, 60.0);
        tempo.play();
        // one beat per 1000 samples; start halfway into beat 3
        tempo.sync_to_beats(3.5);

        let mut hits = [0usize; 3];
        let mut n = 0;
        for i in 0..2000 {
            if tempo.advance_and_cross(1.0) {
                hits[n] = i;
                n += 1;
            }
        }
        assert_eq!(n, 2);
        // crossing into beat 4 happens after 500 samples
        assert!((499..=500).contains(&hits[0]), "first crossing at {}", hits[0]);
        assert!((1499..=1500).contains(&hits[1]), "second crossing at {}", hits[1]);
    }

    #[test]
    fn test_sync_rejects_non_finite() {
        let mut tempo = TempoManager::default();
        tempo.sync_to_beats(f64::NAN);
        assert_eq!(tempo.beat_position(), 0.0);
        tempo.sync_to_beats(-4.0);
        assert_eq!(tempo.beat_position(), 0.0);
    }
}
