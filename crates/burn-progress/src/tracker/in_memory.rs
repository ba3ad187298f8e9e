use super::{ExperimentTracker, RunConfig, RunSettings, TrackerError};
use std::{cell::RefCell, rc::Rc};

/// Values logged at one step.
pub type TrackerRow = (u64, Vec<(String, Option<f64>)>);

/// Everything an [InMemoryTracker] received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerRecords {
    /// Settings of every started run.
    pub runs: Vec<RunSettings>,
    /// Logged rows, in order.
    pub rows: Vec<TrackerRow>,
    /// Last saved configuration.
    pub config: RunConfig,
    /// Number of finished runs.
    pub finished: usize,
}

impl TrackerRecords {
    /// Every value logged for a key, with its step.
    pub fn values(&self, key: &str) -> Vec<(u64, Option<f64>)> {
        self.rows
            .iter()
            .flat_map(|(step, values)| {
                values
                    .iter()
                    .filter(|(name, _)| name == key)
                    .map(|(_, value)| (*step, *value))
            })
            .collect()
    }
}

/// In memory experiment tracker, useful when testing and debugging.
///
/// Clones share the same records.
#[derive(Clone, Default)]
pub struct InMemoryTracker {
    records: Rc<RefCell<TrackerRecords>>,
}

impl InMemoryTracker {
    /// Create a new in-memory tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of the records.
    pub fn records(&self) -> TrackerRecords {
        self.records.borrow().clone()
    }
}

impl ExperimentTracker for InMemoryTracker {
    fn init(&mut self, settings: &RunSettings) -> Result<(), TrackerError> {
        self.records.borrow_mut().runs.push(settings.clone());
        Ok(())
    }

    fn log(&mut self, values: &[(String, Option<f64>)], step: u64) -> Result<(), TrackerError> {
        self.records.borrow_mut().rows.push((step, values.to_vec()));
        Ok(())
    }

    fn update_config(&mut self, config: &RunConfig) -> Result<(), TrackerError> {
        self.records.borrow_mut().config = config.clone();
        Ok(())
    }

    fn finish(&mut self) -> Result<(), TrackerError> {
        self.records.borrow_mut().finished += 1;
        Ok(())
    }
}
