use super::{BarState, NUM_UPDATES, ProgressBar, resolve_step};
use crate::{
    ProgressError,
    stat::{Stat, Stats},
    tracker::{RunConfig, RunSettings, TrackerHandle},
};

/// Log to an experiment tracker, such as Weights & Biases.
///
/// Only averaging meters (their current value) and plain numbers are sent to the tracker, along
/// with the fractional epoch. Other stats are still forwarded to the wrapped bar.
pub struct TrackerProgressBarWrapper<B> {
    wrapped: B,
    state: BarState,
    yielded: usize,
    tracker: Option<TrackerHandle>,
}

impl<B: ProgressBar> TrackerProgressBarWrapper<B> {
    /// Wrap a bar and start the tracker run of `project`.
    ///
    /// An active run of the tracker session is reused. Without a tracker, a warning is logged
    /// and nothing is tracked.
    pub fn new(
        wrapped: B,
        tracker: Option<TrackerHandle>,
        project: &str,
        run_name: Option<&str>,
    ) -> Result<Self, ProgressError> {
        let source = wrapped.state();
        let mut state = BarState::new(source.n, source.epoch, None);
        state.prefix = source.prefix.clone();

        match &tracker {
            Some(tracker) => {
                let settings =
                    RunSettings::new(project.to_string(), run_name.map(str::to_string), false);
                tracker.init(settings)?;
            }
            None => log::warn!("Experiment tracker not found, nothing will be tracked"),
        }

        Ok(Self {
            wrapped,
            state,
            yielded: 0,
            tracker,
        })
    }

    /// The wrapped bar.
    pub fn inner(&self) -> &B {
        &self.wrapped
    }

    fn log_to_tracker(
        &mut self,
        stats: &Stats,
        tag: Option<&str>,
        step: Option<u64>,
    ) -> Result<(), ProgressError> {
        let Some(tracker) = &self.tracker else {
            return Ok(());
        };

        let step = resolve_step(stats, step)?;
        let prefix = match tag {
            Some(tag) => format!("{tag}/"),
            None => String::new(),
        };

        let mut values = vec![(format!("{prefix}epoch"), self.state.precise_epoch())];
        for (key, stat) in stats.iter().filter(|(key, _)| *key != NUM_UPDATES) {
            match stat {
                Stat::Average(meter) => values.push((format!("{prefix}{key}"), meter.current())),
                Stat::Number(number) => {
                    values.push((format!("{prefix}{key}"), Some(number.to_f64())))
                }
                _ => {}
            }
        }

        tracker.log(&values, step)?;

        Ok(())
    }
}

impl<B: ProgressBar> Iterator for TrackerProgressBarWrapper<B> {
    type Item = B::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state.size.is_none() {
            self.state.size = Some(self.wrapped.length());
        }

        let item = self.wrapped.next()?;
        self.state.i = Some(self.state.n + self.yielded);
        self.yielded += 1;

        Some(item)
    }
}

impl<B: ProgressBar> ProgressBar for TrackerProgressBarWrapper<B> {
    fn state(&self) -> &BarState {
        &self.state
    }

    fn length(&self) -> usize {
        self.wrapped.length()
    }

    fn log(
        &mut self,
        stats: &Stats,
        tag: Option<&str>,
        step: Option<u64>,
    ) -> Result<(), ProgressError> {
        self.log_to_tracker(stats, tag, step)?;
        self.wrapped.log(stats, tag, step)
    }

    fn print(
        &mut self,
        stats: &Stats,
        tag: Option<&str>,
        step: Option<u64>,
    ) -> Result<(), ProgressError> {
        self.log_to_tracker(stats, tag, step)?;
        self.wrapped.print(stats, tag, step)
    }

    fn update_config(&mut self, config: &RunConfig) -> Result<(), ProgressError> {
        if let Some(tracker) = &self.tracker {
            tracker.update_config(config, true)?;
        }
        self.wrapped.update_config(config)
    }

    fn close(&mut self) {
        if let Some(tracker) = &self.tracker
            && let Err(err) = tracker.flush()
        {
            log::error!("Failed to flush the experiment tracker: {err}");
        }
        self.wrapped.close();
    }
}
