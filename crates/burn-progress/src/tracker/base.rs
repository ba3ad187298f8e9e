use serde::Serialize;
use std::{cell::RefCell, rc::Rc};

/// Configuration of an experiment tracker run.
pub type RunConfig = serde_json::Map<String, serde_json::Value>;

/// Error raised by an experiment tracker.
#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    /// No run was started.
    #[error("No run was initialized, call `init` first")]
    NotInitialized,

    /// A config value would be overwritten while overwriting is not allowed.
    #[error("Config value of `{key}` can't change from {current} to {new}")]
    ConfigConflict {
        /// The config key.
        key: String,
        /// The value already set.
        current: serde_json::Value,
        /// The rejected value.
        new: serde_json::Value,
    },

    /// A project or run name can't be used as a directory name.
    #[error("Invalid project or run name: '{0}'")]
    InvalidName(String),

    /// Serde error.
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings used to start a run.
#[derive(new, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSettings {
    /// The project the run belongs to.
    pub project: String,
    /// The name of the run, generated by the backend when missing.
    pub run_name: Option<String>,
    /// Start a new run even when one is already active.
    pub reinit: bool,
}

/// Backend of an experiment tracking service.
///
/// Backends are driven through a [TrackerHandle], which starts at most one run at a time and
/// keeps the run configuration.
pub trait ExperimentTracker {
    /// Start a new run.
    fn init(&mut self, settings: &RunSettings) -> Result<(), TrackerError>;

    /// Log values at a step. A missing value is logged as empty.
    fn log(&mut self, values: &[(String, Option<f64>)], step: u64) -> Result<(), TrackerError>;

    /// Save the run configuration.
    ///
    /// The backend receives the whole configuration of the run, after the update.
    fn update_config(&mut self, config: &RunConfig) -> Result<(), TrackerError>;

    /// Flush the pending values.
    fn flush(&mut self) -> Result<(), TrackerError> {
        Ok(())
    }

    /// End the active run.
    fn finish(&mut self) -> Result<(), TrackerError> {
        Ok(())
    }
}

/// Handle to the experiment tracker session of the process.
///
/// Clones share the same session, so every progress bar created with the same handle reports to
/// the same run.
#[derive(Clone)]
pub struct TrackerHandle {
    session: Rc<RefCell<TrackerSession>>,
}

struct TrackerSession {
    backend: Box<dyn ExperimentTracker>,
    run: Option<RunSettings>,
    config: RunConfig,
}

impl TrackerHandle {
    /// Create a new session without any active run.
    pub fn new<T: ExperimentTracker + 'static>(backend: T) -> Self {
        Self {
            session: Rc::new(RefCell::new(TrackerSession {
                backend: Box::new(backend),
                run: None,
                config: RunConfig::new(),
            })),
        }
    }

    /// Start a run.
    ///
    /// Without `reinit`, an active run is kept and the backend isn't initialized again.
    pub fn init(&self, settings: RunSettings) -> Result<(), TrackerError> {
        let mut session = self.session.borrow_mut();

        if let Some(run) = &session.run {
            if !settings.reinit {
                if run.project != settings.project || run.run_name != settings.run_name {
                    log::warn!(
                        "A run of project '{}' is already active, ignoring the new project '{}'",
                        run.project,
                        settings.project
                    );
                }
                return Ok(());
            }

            session.backend.finish()?;
            session.run = None;
            session.config.clear();
        }

        session.backend.init(&settings)?;
        log::info!("Started experiment tracker run of project '{}'", settings.project);
        session.run = Some(settings);

        Ok(())
    }

    /// Settings of the active run.
    pub fn run(&self) -> Option<RunSettings> {
        self.session.borrow().run.clone()
    }

    /// Configuration of the active run.
    pub fn config(&self) -> RunConfig {
        self.session.borrow().config.clone()
    }

    /// Log values at a step.
    pub fn log(&self, values: &[(String, Option<f64>)], step: u64) -> Result<(), TrackerError> {
        let mut session = self.session.borrow_mut();

        if session.run.is_none() {
            return Err(TrackerError::NotInitialized);
        }

        session.backend.log(values, step)
    }

    /// Merge `config` into the run configuration.
    ///
    /// When `allow_overwrite` is false, changing the value of an existing key fails and nothing is
    /// updated.
    pub fn update_config(&self, config: &RunConfig, allow_overwrite: bool) -> Result<(), TrackerError> {
        let mut session = self.session.borrow_mut();

        if session.run.is_none() {
            return Err(TrackerError::NotInitialized);
        }

        if !allow_overwrite {
            for (key, new) in config.iter() {
                if let Some(current) = session.config.get(key)
                    && current != new
                {
                    return Err(TrackerError::ConfigConflict {
                        key: key.clone(),
                        current: current.clone(),
                        new: new.clone(),
                    });
                }
            }
        }

        for (key, value) in config.iter() {
            session.config.insert(key.clone(), value.clone());
        }

        let TrackerSession {
            backend, config, ..
        } = &mut *session;
        backend.update_config(config)
    }

    /// Flush the pending values of the backend.
    pub fn flush(&self) -> Result<(), TrackerError> {
        self.session.borrow_mut().backend.flush()
    }

    /// End the active run, if any.
    pub fn finish(&self) -> Result<(), TrackerError> {
        let mut session = self.session.borrow_mut();

        if session.run.take().is_some() {
            session.config.clear();
            session.backend.finish()?;
        }

        Ok(())
    }
}
