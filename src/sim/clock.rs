/// A calculation clock that yields the scheduled ticks of one calculation.
///
/// Ticks fall at `offset + k * period` for `k = 1, 2, ...` as long as they
/// do not exceed the run duration.
///
/// # Examples
///
/// ```
/// use pvsystem_service::sim::clock::Clock;
///
/// let mut clock = Clock::new(900, 0, 3600);
/// let mut times = Vec::new();
///
/// clock.run(|step, elapsed| times.push((step, elapsed)));
/// assert_eq!(times, vec![(1, 900), (2, 1800), (3, 2700), (4, 3600)]);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// Steps already yielded
    current: usize,
    /// Total steps within the run duration
    total: usize,
    period_secs: u64,
    offset_secs: u64,
}

impl Clock {
    /// Creates a clock for one calculation schedule.
    ///
    /// # Arguments
    ///
    /// * `period_secs` - Tick cadence in seconds
    /// * `offset_secs` - One-shot offset before the first period
    /// * `duration_secs` - Run duration; no tick is scheduled past it
    ///
    /// # Panics
    ///
    /// Panics if `period_secs` is zero.
    pub fn new(period_secs: u64, offset_secs: u64, duration_secs: u64) -> Self {
        assert!(period_secs > 0, "period_secs must be > 0");
        let total = duration_secs.saturating_sub(offset_secs) / period_secs;
        Self {
            current: 0,
            total: total as usize,
            period_secs,
            offset_secs,
        }
    }

    /// Total number of ticks.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Elapsed seconds of the 1-based `step`.
    pub fn elapsed_at(&self, step: usize) -> u64 {
        self.offset_secs + step as u64 * self.period_secs
    }

    /// Advances the clock by one tick.
    ///
    /// # Returns
    ///
    /// * `Some((step, elapsed_secs))` - The 1-based step and its elapsed time
    /// * `None` - If every tick has been yielded
    pub fn tick(&mut self) -> Option<(usize, u64)> {
        if self.current < self.total {
            self.current += 1;
            Some((self.current, self.elapsed_at(self.current)))
        } else {
            None
        }
    }

    /// Runs a function for each remaining tick.
    pub fn run(&mut self, mut f: impl FnMut(usize, u64)) {
        while let Some((step, elapsed)) = self.tick() {
            f(step, elapsed);
        }
    }
}
