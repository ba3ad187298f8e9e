use super::round_decimals;

/// Computes and stores the average and current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AverageMeter {
    val: Option<f64>,
    sum: f64,
    count: f64,
    round: Option<u32>,
}

impl AverageMeter {
    /// Create a new empty meter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Round the smoothed value to the given number of decimals.
    pub fn with_round(mut self, decimals: u32) -> Self {
        self.round = Some(decimals);
        self
    }

    /// Record `val`, weighted by `n`.
    ///
    /// The current value is always replaced, but only a positive weight updates the average.
    pub fn update(&mut self, val: f64, n: f64) {
        self.val = Some(val);

        if n > 0.0 {
            self.sum += val * n;
            self.count += n;
        }
    }

    /// Clear the meter.
    pub fn reset(&mut self) {
        self.val = None;
        self.sum = 0.0;
        self.count = 0.0;
    }

    /// The last recorded value, zero when nothing was recorded.
    pub fn val(&self) -> f64 {
        self.val.unwrap_or_default()
    }

    /// The last recorded value, if any.
    pub fn current(&self) -> Option<f64> {
        self.val
    }

    /// The weighted sum of the recorded values.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// The sum of the weights.
    pub fn count(&self) -> f64 {
        self.count
    }

    /// The running average, or the last value when no weight was recorded.
    pub fn avg(&self) -> f64 {
        if self.count > 0.0 {
            self.sum / self.count
        } else {
            self.val()
        }
    }

    /// The running average rounded to the configured number of decimals.
    pub fn smoothed_value(&self) -> f64 {
        round_decimals(self.avg(), self.round)
    }
}

impl FromIterator<f64> for AverageMeter {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        let mut meter = Self::new();
        iter.into_iter().for_each(|value| meter.update(value, 1.0));
        meter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_of_recorded_values() {
        let meter = AverageMeter::from_iter([2.0, 4.0]);

        assert_eq!(meter.avg(), 3.0);
        assert_eq!(meter.val(), 4.0);
        assert_eq!(meter.count(), 2.0);
    }

    #[test]
    fn test_weighted_update() {
        let mut meter = AverageMeter::new();
        meter.update(1.0, 3.0);
        meter.update(5.0, 1.0);

        assert_eq!(meter.avg(), 2.0);
    }

    #[test]
    fn test_zero_weight_only_sets_value() {
        let mut meter = AverageMeter::new();
        meter.update(7.0, 0.0);

        assert_eq!(meter.count(), 0.0);
        assert_eq!(meter.avg(), 7.0);
    }

    #[test]
    fn test_smoothed_value_is_rounded() {
        let meter = AverageMeter::from_iter([1.0, 2.0, 2.0]).with_round(2);

        assert_eq!(meter.smoothed_value(), 1.67);
    }

    #[test]
    fn test_reset() {
        let mut meter = AverageMeter::from_iter([1.0]);
        meter.reset();

        assert_eq!(meter, AverageMeter::new());
        assert_eq!(meter.avg(), 0.0);
        assert_eq!(meter.current(), None);
    }

    #[test]
    fn test_current_value() {
        let mut meter = AverageMeter::new();
        assert_eq!(meter.current(), None);

        meter.update(0.5, 0.0);
        assert_eq!(meter.current(), Some(0.5));
    }
}
