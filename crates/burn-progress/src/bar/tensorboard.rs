use super::{BarState, NUM_UPDATES, ProgressBar, resolve_step};
use crate::{
    ProgressError,
    stat::{Stat, Stats},
    tracker::RunConfig,
};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Writer of scalar summaries.
pub trait ScalarWriter {
    /// Add a scalar value at a step.
    fn add_scalar(&mut self, tag: &str, value: f64, step: u64);

    /// Flush the pending summaries.
    fn flush(&mut self);
}

/// Creates the [scalar writer](ScalarWriter) of a log directory.
pub trait ScalarWriterFactory {
    /// Create a writer saving its summaries in `logdir`.
    fn create(&self, logdir: &Path) -> Box<dyn ScalarWriter>;
}

/// Writes TensorBoard event files.
#[cfg(feature = "tensorboard")]
pub struct EventFileWriterFactory;

#[cfg(feature = "tensorboard")]
impl ScalarWriterFactory for EventFileWriterFactory {
    fn create(&self, logdir: &Path) -> Box<dyn ScalarWriter> {
        if let Err(err) = std::fs::create_dir_all(logdir) {
            log::error!("Failed to create the directory '{}': {err}", logdir.display());
        }
        Box::new(tensorboard_rs::summary_writer::SummaryWriter::new(logdir))
    }
}

#[cfg(feature = "tensorboard")]
impl ScalarWriter for tensorboard_rs::summary_writer::SummaryWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: u64) {
        tensorboard_rs::summary_writer::SummaryWriter::add_scalar(
            self,
            tag,
            value as f32,
            step as usize,
        );
    }

    fn flush(&mut self) {
        let _ = tensorboard_rs::summary_writer::SummaryWriter::flush(self);
    }
}

/// The default factory, writing TensorBoard event files.
#[cfg(feature = "tensorboard")]
pub fn default_writer_factory() -> Option<Box<dyn ScalarWriterFactory>> {
    Some(Box::new(EventFileWriterFactory))
}

/// The default factory, missing since TensorBoard support is disabled.
#[cfg(not(feature = "tensorboard"))]
pub fn default_writer_factory() -> Option<Box<dyn ScalarWriterFactory>> {
    log::warn!("TensorBoard support is disabled, enable the `tensorboard` feature of burn-progress");
    None
}

/// Log to TensorBoard.
///
/// Each tag gets its own writer in a sub-directory of the log directory, created the first time
/// the tag is used.
pub struct TensorboardProgressBarWrapper<B> {
    wrapped: B,
    logdir: PathBuf,
    factory: Option<Box<dyn ScalarWriterFactory>>,
    writers: HashMap<String, Box<dyn ScalarWriter>>,
}

impl<B: ProgressBar> TensorboardProgressBarWrapper<B> {
    /// Wrap a bar, writing event files in `logdir`.
    pub fn new(wrapped: B, logdir: impl AsRef<Path>) -> Self {
        Self::with_factory(wrapped, logdir, default_writer_factory())
    }

    /// Wrap a bar with the given writer factory.
    ///
    /// Without a factory, nothing is written to TensorBoard and the calls are only forwarded.
    pub fn with_factory(
        wrapped: B,
        logdir: impl AsRef<Path>,
        factory: Option<Box<dyn ScalarWriterFactory>>,
    ) -> Self {
        Self {
            wrapped,
            logdir: logdir.as_ref().to_path_buf(),
            factory,
            writers: HashMap::new(),
        }
    }

    /// The wrapped bar.
    pub fn inner(&self) -> &B {
        &self.wrapped
    }

    fn writer(&mut self, key: &str) -> Option<&mut Box<dyn ScalarWriter>> {
        let factory = self.factory.as_ref()?;
        let logdir = &self.logdir;

        Some(
            self.writers
                .entry(key.to_string())
                .or_insert_with(|| factory.create(&logdir.join(key))),
        )
    }

    fn log_to_tensorboard(
        &mut self,
        stats: &Stats,
        tag: Option<&str>,
        step: Option<u64>,
    ) -> Result<(), ProgressError> {
        if self.factory.is_none() {
            return Ok(());
        }

        let step = resolve_step(stats, step)?;
        let Some(writer) = self.writer(tag.unwrap_or_default()) else {
            return Ok(());
        };

        for (key, stat) in stats.iter().filter(|(key, _)| *key != NUM_UPDATES) {
            let value = match stat {
                Stat::Average(meter) => meter.current(),
                Stat::Number(number) => Some(number.to_f64()),
                Stat::Tensor(value) => value.scalar(),
                _ => None,
            };

            if let Some(value) = value {
                writer.add_scalar(key, value, step);
            }
        }
        writer.flush();

        Ok(())
    }
}

impl<B: ProgressBar> Iterator for TensorboardProgressBarWrapper<B> {
    type Item = B::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.wrapped.next()
    }
}

impl<B: ProgressBar> ProgressBar for TensorboardProgressBarWrapper<B> {
    fn state(&self) -> &BarState {
        self.wrapped.state()
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
        self.log_to_tensorboard(stats, tag, step)?;
        self.wrapped.log(stats, tag, step)
    }

    fn print(
        &mut self,
        stats: &Stats,
        tag: Option<&str>,
        step: Option<u64>,
    ) -> Result<(), ProgressError> {
        self.log_to_tensorboard(stats, tag, step)?;
        self.wrapped.print(stats, tag, step)
    }

    fn update_config(&mut self, config: &RunConfig) -> Result<(), ProgressError> {
        self.wrapped.update_config(config)
    }

    fn close(&mut self) {
        for writer in self.writers.values_mut() {
            writer.flush();
        }
        self.writers.clear();
        self.wrapped.close();
    }
}
