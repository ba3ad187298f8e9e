use crate::ConfigError;
use core::{fmt::Display, str::FromStr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output format of the base progress bar.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per log line.
    #[default]
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnknownLogFormat(value.to_string())),
        }
    }
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
        }
    }
}

/// Configuration used by [build_progress_bar](crate::build_progress_bar).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProgressBarConfig {
    /// Format of the base progress bar.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Number of steps between two intermediate log lines.
    #[serde(default = "default_log_interval")]
    pub log_interval: usize,
    /// File receiving a copy of every log line.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Current epoch, starting at 1.
    #[serde(default)]
    pub epoch: Option<usize>,
    /// Text appended to the epoch in the display prefix.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Directory of the TensorBoard summaries, disabled when missing.
    #[serde(default)]
    pub tensorboard_logdir: Option<PathBuf>,
    /// Experiment tracker project, disabled when missing.
    #[serde(default)]
    pub tracker_project: Option<String>,
    /// Name of the experiment tracker run.
    #[serde(default)]
    pub tracker_run_name: Option<String>,
}

fn default_log_interval() -> usize {
    100
}

impl Default for ProgressBarConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_interval: default_log_interval(),
            log_file: None,
            epoch: None,
            prefix: None,
            tensorboard_logdir: None,
            tracker_project: None,
            tracker_run_name: None,
        }
    }
}

impl ProgressBarConfig {
    /// Create a new config with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log format.
    pub fn with_log_format(mut self, log_format: LogFormat) -> Self {
        self.log_format = log_format;
        self
    }

    /// Sets the log format from its name, failing on unknown formats.
    pub fn with_log_format_str(self, log_format: &str) -> Result<Self, ConfigError> {
        Ok(self.with_log_format(log_format.parse()?))
    }

    /// Sets the log interval.
    pub fn with_log_interval(mut self, log_interval: usize) -> Self {
        self.log_interval = log_interval;
        self
    }

    /// Sets the log file.
    pub fn with_log_file(mut self, log_file: impl AsRef<Path>) -> Self {
        self.log_file = Some(log_file.as_ref().to_path_buf());
        self
    }

    /// Sets the epoch.
    pub fn with_epoch(mut self, epoch: usize) -> Self {
        self.epoch = Some(epoch);
        self
    }

    /// Sets the prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets the TensorBoard directory.
    pub fn with_tensorboard_logdir(mut self, logdir: impl AsRef<Path>) -> Self {
        self.tensorboard_logdir = Some(logdir.as_ref().to_path_buf());
        self
    }

    /// Sets the experiment tracker project.
    pub fn with_tracker_project(mut self, project: impl Into<String>) -> Self {
        self.tracker_project = Some(project.into());
        self
    }

    /// Sets the experiment tracker run name.
    pub fn with_tracker_run_name(mut self, run_name: impl Into<String>) -> Self {
        self.tracker_run_name = Some(run_name.into());
        self
    }

    /// Saves the configuration to a file as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, file: P) -> std::io::Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(file, content)
    }

    /// Loads the configuration from a file.
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(file.as_ref())
            .map_err(|_| ConfigError::FileNotFound(file.as_ref().to_string_lossy().to_string()))?;
        Self::load_str(&content)
    }

    /// Loads the configuration from a JSON string.
    pub fn load_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|err| ConfigError::InvalidFormat(format!("{err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_format() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!(matches!(
            "tqdm".parse::<LogFormat>(),
            Err(ConfigError::UnknownLogFormat(name)) if name == "tqdm"
        ));
    }

    #[test]
    fn test_unknown_log_format_in_json_is_rejected() {
        let result = ProgressBarConfig::load_str(r#"{"log_format": "simple"}"#);

        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = ProgressBarConfig::load_str("{}").unwrap();

        assert_eq!(config, ProgressBarConfig::default());
        assert_eq!(config.log_interval, 100);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("progress.json");
        let config = ProgressBarConfig::new()
            .with_epoch(2)
            .with_prefix("train")
            .with_log_interval(10)
            .with_tracker_project("lm");

        config.save(&file).unwrap();

        assert_eq!(ProgressBarConfig::load(&file).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProgressBarConfig::load(dir.path().join("missing.json"));

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
