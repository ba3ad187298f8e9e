use super::round_decimals;
use std::time::Instant;

/// Computes the average occurrence of some event per second.
#[derive(Debug, Clone)]
pub struct TimeMeter {
    init: f64,
    n: f64,
    start: Instant,
    round: Option<u32>,
}

impl Default for TimeMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeMeter {
    /// Create a new meter starting now.
    pub fn new() -> Self {
        Self::with_state(0.0, 0.0)
    }

    /// Create a meter with `init` seconds and `n` events already recorded.
    pub fn with_state(init: f64, n: f64) -> Self {
        Self {
            init,
            n,
            start: Instant::now(),
            round: None,
        }
    }

    /// Round the smoothed value to the given number of decimals.
    pub fn with_round(mut self, decimals: u32) -> Self {
        self.round = Some(decimals);
        self
    }

    /// Restart the clock with `init` seconds and `n` events already recorded.
    pub fn reset(&mut self, init: f64, n: f64) {
        self.init = init;
        self.n = n;
        self.start = Instant::now();
    }

    /// Record `val` events.
    pub fn update(&mut self, val: f64) {
        self.n += val;
    }

    /// Number of recorded events.
    pub fn n(&self) -> f64 {
        self.n
    }

    /// Seconds since the meter started, including the initial time.
    pub fn elapsed_time(&self) -> f64 {
        self.init + self.start.elapsed().as_secs_f64()
    }

    /// Events per second.
    pub fn avg(&self) -> f64 {
        let elapsed = self.elapsed_time();

        if elapsed > 0.0 { self.n / elapsed } else { 0.0 }
    }

    /// Events per second rounded to the configured number of decimals.
    pub fn smoothed_value(&self) -> f64 {
        round_decimals(self.avg(), self.round)
    }
}
