use super::round_decimals;
use std::time::Instant;

/// Computes the sum and average of the duration of some event in seconds.
#[derive(Debug, Clone, Default)]
pub struct StopwatchMeter {
    sum: f64,
    n: f64,
    start_time: Option<Instant>,
    round: Option<u32>,
}

impl StopwatchMeter {
    /// Create a new stopped meter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stopped meter with `sum` seconds measured over `n` events.
    pub fn with_state(sum: f64, n: f64) -> Self {
        Self {
            sum,
            n,
            ..Default::default()
        }
    }

    /// Round the smoothed value to the given number of decimals.
    pub fn with_round(mut self, decimals: u32) -> Self {
        self.round = Some(decimals);
        self
    }

    /// Start measuring an event.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop measuring and count `n` events. Does nothing when the meter is not started.
    pub fn stop(&mut self, n: f64) {
        if let Some(start_time) = self.start_time.take() {
            self.sum += start_time.elapsed().as_secs_f64();
            self.n += n;
        }
    }

    /// Clear the meter.
    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.n = 0.0;
        self.start();
    }

    /// Total measured seconds.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Number of measured events.
    pub fn n(&self) -> f64 {
        self.n
    }

    /// Average seconds per event, or the total when no event was counted.
    pub fn avg(&self) -> f64 {
        if self.n > 0.0 {
            self.sum / self.n
        } else {
            self.sum
        }
    }

    /// Total seconds, including the running measurement.
    pub fn elapsed_time(&self) -> f64 {
        match self.start_time {
            Some(start_time) => self.sum + start_time.elapsed().as_secs_f64(),
            None => self.sum,
        }
    }

    /// Average rounded to the configured number of decimals.
    pub fn smoothed_value(&self) -> f64 {
        let value = if self.sum > 0.0 {
            self.avg()
        } else {
            self.elapsed_time()
        };
        round_decimals(value, self.round)
    }
}
