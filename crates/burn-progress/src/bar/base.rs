use crate::{
    ProgressError,
    meter::round_decimals,
    stat::{Number, Stat, Stats, TensorValue},
    tracker::RunConfig,
};
use core::ops::{Deref, DerefMut};

/// Key of the statistic holding the number of updates, used as the default step.
pub const NUM_UPDATES: &str = "num_updates";

/// Progress bar over the items of an epoch.
///
/// Iterating the bar yields the items of the underlying iterable. Since iterating only needs
/// `next`, statistics can be logged between two items:
///
/// ```ignore
/// while let Some(batch) = bar.next() {
///     let stats = train_step(batch);
///     bar.log(&stats, Some("train"), None)?;
/// }
/// ```
///
/// Wrappers own the bar they wrap, forward every call to it and additionally report the
/// statistics to their own backend.
pub trait ProgressBar: Iterator {
    /// The iteration state of the bar.
    fn state(&self) -> &BarState;

    /// The number of items of the underlying iterable.
    fn length(&self) -> usize;

    /// Log intermediate stats.
    ///
    /// Bars may skip some calls, e.g. to log only at a fixed interval.
    fn log(
        &mut self,
        stats: &Stats,
        tag: Option<&str>,
        step: Option<u64>,
    ) -> Result<(), ProgressError>;

    /// Print end-of-epoch stats.
    fn print(
        &mut self,
        stats: &Stats,
        tag: Option<&str>,
        step: Option<u64>,
    ) -> Result<(), ProgressError>;

    /// Log the latest configuration.
    fn update_config(&mut self, _config: &RunConfig) -> Result<(), ProgressError> {
        Ok(())
    }

    /// Flush and release the resources of the bar.
    ///
    /// Errors are logged, never returned.
    fn close(&mut self) {}

    /// The current epoch.
    fn epoch(&self) -> Option<usize> {
        self.state().epoch
    }

    /// The display prefix.
    fn prefix(&self) -> &str {
        &self.state().prefix
    }

    /// Take the bar in a guard closing it when dropped, including when unwinding.
    fn scoped(self) -> ProgressBarGuard<Self>
    where
        Self: Sized,
    {
        ProgressBarGuard { bar: self }
    }
}

impl<B: ProgressBar + ?Sized> ProgressBar for Box<B> {
    fn state(&self) -> &BarState {
        (**self).state()
    }

    fn length(&self) -> usize {
        (**self).length()
    }

    fn log(
        &mut self,
        stats: &Stats,
        tag: Option<&str>,
        step: Option<u64>,
    ) -> Result<(), ProgressError> {
        (**self).log(stats, tag, step)
    }

    fn print(
        &mut self,
        stats: &Stats,
        tag: Option<&str>,
        step: Option<u64>,
    ) -> Result<(), ProgressError> {
        (**self).print(stats, tag, step)
    }

    fn update_config(&mut self, config: &RunConfig) -> Result<(), ProgressError> {
        (**self).update_config(config)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Iteration state of a progress bar.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarState {
    /// Number of items consumed before the bar was created.
    pub n: usize,
    /// Position of the last yielded item, counting the items consumed before the bar.
    pub i: Option<usize>,
    /// Number of items, known once the iteration started.
    pub size: Option<usize>,
    /// The current epoch, starting at 1.
    pub epoch: Option<usize>,
    /// The display prefix.
    pub prefix: String,
}

impl BarState {
    /// Create the state of a bar that didn't start iterating.
    ///
    /// The prefix is `epoch {epoch:03}`, followed by `prefix` separated with ` | ` when both
    /// are given.
    pub fn new(n: usize, epoch: Option<usize>, prefix: Option<&str>) -> Self {
        let mut display = String::new();

        if let Some(epoch) = epoch {
            display += &format!("epoch {epoch:03}");
        }
        if let Some(prefix) = prefix {
            if !display.is_empty() {
                display += " | ";
            }
            display += prefix;
        }

        Self {
            n,
            i: None,
            size: None,
            epoch,
            prefix: display,
        }
    }

    /// The fractional epoch reached by the last yielded item.
    pub fn precise_epoch(&self) -> Option<f64> {
        match (self.i, self.size) {
            (Some(i), Some(size)) => get_precise_epoch(self.epoch, i, size),
            _ => None,
        }
    }
}

/// The fractional epoch after `count + 1` items out of `iterator_size`.
///
/// Returns `None` when the epoch is unknown or the iterator is empty.
pub fn get_precise_epoch(epoch: Option<usize>, count: usize, iterator_size: usize) -> Option<f64> {
    match epoch {
        Some(epoch) if iterator_size > 0 => {
            Some(epoch as f64 - 1.0 + (count + 1) as f64 / iterator_size as f64)
        }
        _ => None,
    }
}

/// The fractional epoch rounded to 3 decimals, as displayed in log lines.
pub(crate) fn display_epoch(state: &BarState) -> Option<f64> {
    state
        .precise_epoch()
        .map(|epoch| round_decimals(epoch, Some(3)))
}

/// The step of a log call, read from the `num_updates` stat when not given.
pub fn resolve_step(stats: &Stats, step: Option<u64>) -> Result<u64, ProgressError> {
    if let Some(step) = step {
        return Ok(step);
    }

    let stat = stats.get(NUM_UPDATES).ok_or(ProgressError::MissingStep)?;
    let step = match stat {
        Stat::Number(Number::Int(value)) | Stat::Tensor(TensorValue::Int(value)) => {
            u64::try_from(*value).ok()
        }
        Stat::Number(Number::Float(value)) | Stat::Tensor(TensorValue::Float(value))
            if *value >= 0.0 && value.fract() == 0.0 =>
        {
            Some(*value as u64)
        }
        _ => None,
    };

    step.ok_or_else(|| ProgressError::InvalidStep(crate::stat::format_stat(stat)))
}

/// Guard closing a progress bar when dropped.
///
/// Dereferences to the bar, so the bar can be iterated and used to log through the guard.
pub struct ProgressBarGuard<B: ProgressBar> {
    bar: B,
}

impl<B: ProgressBar> Deref for ProgressBarGuard<B> {
    type Target = B;

    fn deref(&self) -> &Self::Target {
        &self.bar
    }
}

impl<B: ProgressBar> DerefMut for ProgressBarGuard<B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.bar
    }
}

impl<B: ProgressBar> Drop for ProgressBarGuard<B> {
    fn drop(&mut self) {
        self.bar.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::test_utils::{BarCall, RecordingBar};

    #[test]
    fn test_prefix() {
        assert_eq!(BarState::new(0, Some(3), Some("train")).prefix, "epoch 003 | train");
        assert_eq!(BarState::new(0, Some(12), None).prefix, "epoch 012");
        assert_eq!(BarState::new(0, None, Some("train")).prefix, "train");
        assert_eq!(BarState::new(0, None, None).prefix, "");
    }

    #[test]
    fn test_precise_epoch() {
        assert_eq!(get_precise_epoch(Some(2), 9, 10), Some(2.0));
        assert_eq!(get_precise_epoch(Some(1), 4, 10), Some(0.5));
        assert_eq!(get_precise_epoch(None, 9, 10), None);
        assert_eq!(get_precise_epoch(Some(2), 0, 0), None);
    }

    #[test]
    fn test_precise_epoch_needs_iteration() {
        let mut state = BarState::new(0, Some(1), None);
        assert_eq!(state.precise_epoch(), None);

        state.size = Some(3);
        state.i = Some(0);
        assert_eq!(display_epoch(&state), Some(0.333));
    }

    #[test]
    fn test_resolve_step() {
        let stats = Stats::new().with(NUM_UPDATES, 12);

        assert_eq!(resolve_step(&stats, Some(3)).unwrap(), 3);
        assert_eq!(resolve_step(&stats, None).unwrap(), 12);
        assert_eq!(
            resolve_step(&Stats::new().with(NUM_UPDATES, 4.0), None).unwrap(),
            4
        );
        assert!(matches!(
            resolve_step(&Stats::new(), None),
            Err(ProgressError::MissingStep)
        ));
        assert!(matches!(
            resolve_step(&Stats::new().with(NUM_UPDATES, -1), None),
            Err(ProgressError::InvalidStep(_))
        ));
    }

    #[test]
    fn test_guard_closes_on_drop() {
        let bar = RecordingBar::new(vec![1, 2, 3]);
        let calls = bar.calls();

        {
            let mut guard = bar.scoped();
            assert_eq!(guard.next(), Some(1));
        }

        assert_eq!(calls.borrow().last(), Some(&BarCall::Close));
    }

    #[test]
    fn test_guard_closes_on_panic() {
        let bar = RecordingBar::new(vec![1]);
        let calls = bar.calls();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = bar.scoped();
            panic!("training failed");
        }));

        assert!(result.is_err());
        assert_eq!(calls.borrow().last(), Some(&BarCall::Close));
    }
}
