use crate::tracker::TrackerError;

/// Error raised while reading or validating a progress bar configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The log format is not one of the supported formats.
    #[error("Unknown log format: {0}")]
    UnknownLogFormat(String),

    /// The configuration could not be parsed.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The configuration file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),
}

/// Error raised by a progress bar or one of its sinks.
#[derive(thiserror::Error, Debug)]
pub enum ProgressError {
    /// No step was given and the stats don't contain `num_updates`.
    #[error("No step was provided and the stats have no `num_updates` entry")]
    MissingStep,

    /// The `num_updates` stat can't be used as a step.
    #[error("The `num_updates` stat is not a non-negative integer: {0}")]
    InvalidStep(String),

    /// Invalid configuration.
    #[error("Config error => {0}")]
    Config(#[from] ConfigError),

    /// The experiment tracker failed.
    #[error("Tracker error => {0}")]
    Tracker(#[from] TrackerError),

    /// Failed to serialize a log record.
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Failed to write to a log sink.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
