//! Grain trigger timing and source selection.
//!
//! The scheduler turns the per-sample open/closed decision into grain
//! triggers. Free-running, it fires on each rising edge and then once per
//! hop while open. Locked to a grid, it fires only on grid points while
//! open; the caller reports grid crossings.

/// Per-lane trigger scheduler.
///
/// # Example
///
/// ```rust
/// use graingate_engine::GrainScheduler;
///
/// let mut sched = GrainScheduler::new();
/// let fired: Vec<bool> = (0..7).map(|_| sched.step(true, 3, None)).collect();
/// assert_eq!(fired, [true, false, false, true, false, false, true]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrainScheduler {
    was_open: bool,
    countdown: u32,
    source_accumulator: f32,
}

impl GrainScheduler {
    /// Create a scheduler in the closed state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one sample and report whether a grain starts on it.
    ///
    /// `grid` is `Some(crossed)` when locked to a grid, `None` when
    /// free-running with a period of `hop` samples (minimum 1).
    #[inline]
    pub fn step(&mut self, open: bool, hop: u32, grid: Option<bool>) -> bool {
        let rising = open && !self.was_open;
        self.was_open = open;

        let fire = match grid {
            _ if !open => false,
            Some(crossed) => crossed,
            None => rising || self.countdown == 0,
        };

        if fire && grid.is_none() {
            self.countdown = hop.max(1);
        }
        self.countdown = self.countdown.saturating_sub(1);
        fire
    }

    /// Choose the input for the next grain: `true` selects input B.
    ///
    /// An error-diffusion accumulator spreads B grains evenly, so over
    /// any run of grains the share reading B tracks `crossfade`.
    ///
    /// ```rust
    /// use graingate_engine::GrainScheduler;
    ///
    /// let mut sched = GrainScheduler::new();
    /// let picks: Vec<bool> = (0..4).map(|_| sched.next_source(0.5)).collect();
    /// assert_eq!(picks, [false, true, false, true]);
    /// ```
    #[inline]
    pub fn next_source(&mut self, crossfade: f32) -> bool {
        self.source_accumulator += crossfade.clamp(0.0, 1.0);
        if self.source_accumulator >= 1.0 {
            self.source_accumulator -= 1.0;
            true
        } else {
            false
        }
    }

    /// Whether the last step was open.
    pub fn is_open(&self) -> bool {
        self.was_open
    }

    /// Return to the closed state and clear the source accumulator.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn test_closed_never_fires() {
        let mut sched = GrainScheduler::new();
        assert!((0..100).all(|_| !sched.step(false, 4, None)));
        assert!((0..100).all(|_| !sched.step(false, 4, Some(true))));
    }

    #[test]
    fn test_rising_edge_fires_immediately() {
        let mut sched = GrainScheduler::new();
        for _ in 0..2 {
            sched.step(true, 100, None);
        }
        sched.step(false, 100, None);
        // Reopening mid-hop fires again
        assert!(sched.step(true, 100, None));
        assert!(!sched.step(true, 100, None));
    }

    #[test]
    fn test_free_running_period() {
        let mut sched = GrainScheduler::new();
        let positions: Vec<usize> = (0..20).filter(|_| sched.step(true, 5, None)).collect();
        assert_eq!(positions, [0, 5, 10, 15]);
    }

    #[test]
    fn test_hop_of_zero_fires_every_sample() {
        let mut sched = GrainScheduler::new();
        assert!((0..10).all(|_| sched.step(true, 0, None)));
    }

    #[test]
    fn test_grid_locked_ignores_edges() {
        let mut sched = GrainScheduler::new();
        // Rising edge without a grid point does not fire
        assert!(!sched.step(true, 5, Some(false)));
        assert!(sched.step(true, 5, Some(true)));
        assert!(!sched.step(false, 5, Some(true)));
    }

    #[test]
    fn test_source_selection_share() {
        let mut sched = GrainScheduler::new();
        assert!((0..50).all(|_| !sched.next_source(0.0)));
        assert!((0..50).all(|_| sched.next_source(1.0)));

        let mut sched = GrainScheduler::new();
        let b = (0..100).filter(|_| sched.next_source(0.25)).count();
        assert_eq!(b, 25);
    }

    #[test]
    fn test_reset() {
        let mut sched = GrainScheduler::new();
        sched.step(true, 5, None);
        sched.next_source(0.7);
        sched.reset();
        assert_eq!(sched, GrainScheduler::new());
    }
}
