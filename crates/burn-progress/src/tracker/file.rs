use super::{ExperimentTracker, RunConfig, RunSettings, TrackerError};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

const METRICS_FILE: &str = "metrics.jsonl";
const CONFIG_FILE: &str = "config.json";
const RUN_PREFIX: &str = "run-";

/// Offline experiment tracker writing each run to its own directory.
///
/// A run lives in `<directory>/<project>/<run name>` and contains:
///
/// * `metrics.jsonl`: one JSON object per logged step, with the step under `_step`.
/// * `config.json`: the run configuration.
pub struct FileTracker {
    directory: PathBuf,
    run: Option<FileRun>,
}

struct FileRun {
    directory: PathBuf,
    metrics: BufWriter<File>,
}

impl FileTracker {
    /// Create a new file tracker.
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory containing the projects.
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            run: None,
        }
    }

    /// Directory of the active run.
    pub fn run_directory(&self) -> Option<&Path> {
        self.run.as_ref().map(|run| run.directory.as_path())
    }

    fn next_run_name(project_directory: &Path) -> Result<String, TrackerError> {
        let mut max_run = 0;

        for entry in fs::read_dir(project_directory)? {
            let entry = entry?;
            let dir_name = entry.file_name().to_string_lossy().to_string();

            if let Some(index) = dir_name.strip_prefix(RUN_PREFIX)
                && let Ok(index) = index.parse::<usize>()
            {
                max_run = max_run.max(index);
            }
        }

        Ok(format!("{RUN_PREFIX}{}", max_run + 1))
    }

    fn directory_name(name: &str) -> Result<String, TrackerError> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
            || Path::new(name).is_absolute();

        if invalid {
            return Err(TrackerError::InvalidName(name.to_string()));
        }

        Ok(name.replace(' ', "_"))
    }

    fn active_run(&mut self) -> Result<&mut FileRun, TrackerError> {
        self.run.as_mut().ok_or(TrackerError::NotInitialized)
    }
}

impl ExperimentTracker for FileTracker {
    fn init(&mut self, settings: &RunSettings) -> Result<(), TrackerError> {
        self.finish()?;

        let project_directory = self.directory.join(Self::directory_name(&settings.project)?);
        let run_name = settings.run_name.as_deref().map(Self::directory_name).transpose()?;
        fs::create_dir_all(&project_directory)?;

        let run_name = match run_name {
            Some(name) => name,
            None => Self::next_run_name(&project_directory)?,
        };
        let directory = project_directory.join(run_name);
        fs::create_dir_all(&directory)?;

        let metrics = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(directory.join(METRICS_FILE))?;

        self.run = Some(FileRun {
            directory,
            metrics: BufWriter::new(metrics),
        });

        Ok(())
    }

    fn log(&mut self, values: &[(String, Option<f64>)], step: u64) -> Result<(), TrackerError> {
        let run = self.active_run()?;
        let mut row = serde_json::Map::new();
        row.insert("_step".to_string(), step.into());

        for (key, value) in values {
            let value = match value {
                Some(value) => serde_json::Value::from(*value),
                None => serde_json::Value::Null,
            };
            row.insert(key.clone(), value);
        }

        serde_json::to_writer(&mut run.metrics, &row)?;
        run.metrics.write_all(b"\n")?;

        Ok(())
    }

    fn update_config(&mut self, config: &RunConfig) -> Result<(), TrackerError> {
        let run = self.active_run()?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(run.directory.join(CONFIG_FILE), content)?;

        Ok(())
    }

    fn flush(&mut self) -> Result<(), TrackerError> {
        if let Some(run) = self.run.as_mut() {
            run.metrics.flush()?;
        }

        Ok(())
    }

    fn finish(&mut self) -> Result<(), TrackerError> {
        if let Some(mut run) = self.run.take() {
            run.metrics.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generates_run_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = FileTracker::new(dir.path());

        tracker.init(&RunSettings::new("lm".into(), None, false)).unwrap();
        assert_eq!(tracker.run_directory().unwrap(), dir.path().join("lm").join("run-1"));

        tracker.init(&RunSettings::new("lm".into(), None, true)).unwrap();
        assert_eq!(tracker.run_directory().unwrap(), dir.path().join("lm").join("run-2"));
    }

    #[test]
    fn test_writes_metrics_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = FileTracker::new(dir.path());
        tracker
            .init(&RunSettings::new("lm".into(), Some("base model".into()), false))
            .unwrap();

        tracker
            .log(&[("train/epoch".into(), None), ("train/loss".into(), Some(0.5))], 3)
            .unwrap();
        tracker
            .update_config(json!({"lr": 0.1}).as_object().unwrap())
            .unwrap();
        tracker.finish().unwrap();

        let run_directory = dir.path().join("lm").join("base_model");
        let metrics = fs::read_to_string(run_directory.join(METRICS_FILE)).unwrap();
        let row: serde_json::Value = serde_json::from_str(metrics.trim()).unwrap();
        assert_eq!(row, json!({"_step": 3, "train/epoch": null, "train/loss": 0.5}));

        let config = fs::read_to_string(run_directory.join(CONFIG_FILE)).unwrap();
        let config: serde_json::Value = serde_json::from_str(&config).unwrap();
        assert_eq!(config, json!({"lr": 0.1}));
    }

    #[test]
    fn test_rejects_names_leaving_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = FileTracker::new(dir.path().join("tracker"));

        for (project, run_name) in [
            ("lm", Some("../escape")),
            ("lm", Some("..")),
            ("../lm", None),
            ("lm", Some("a\\b")),
            ("", None),
        ] {
            let settings = RunSettings::new(project.into(), run_name.map(str::to_string), false);
            assert!(
                matches!(tracker.init(&settings), Err(TrackerError::InvalidName(_))),
                "{project} {run_name:?}"
            );
        }

        assert!(tracker.run_directory().is_none());
        assert!(!dir.path().join("escape").exists());
        assert!(!dir.path().join("tracker").exists());
    }

    #[test]
    fn test_log_without_run_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = FileTracker::new(dir.path());

        assert!(matches!(
            tracker.log(&[], 0),
            Err(TrackerError::NotInitialized)
        ));
    }
}
