use crate::{
    CountingIterator, LogFormat, LoggingContext, ProgressBarConfig, ProgressError,
    bar::{JsonProgressBar, ProgressBar, TensorboardProgressBarWrapper, TrackerProgressBarWrapper},
    tracker::TrackerHandle,
};

/// A progress bar chain with its concrete types erased.
pub type BoxedProgressBar<T> = Box<dyn ProgressBar<Item = T>>;

/// Build the progress bar described by the config.
///
/// The base bar is wrapped with a TensorBoard wrapper when a TensorBoard directory is set, then
/// with an experiment tracker wrapper when a tracker project is set. The outermost bar is
/// returned.
///
/// # Arguments
///
/// * `iterator` - The items of the epoch.
/// * `config` - The progress bar config.
/// * `logging` - The logging context, the log file of the config is attached to it.
/// * `tracker` - The experiment tracker session, tracking is disabled when missing.
pub fn build_progress_bar<I>(
    iterator: CountingIterator<I>,
    config: &ProgressBarConfig,
    logging: &LoggingContext,
    tracker: Option<TrackerHandle>,
) -> Result<BoxedProgressBar<I::Item>, ProgressError>
where
    I: Iterator + 'static,
{
    if let Some(log_file) = &config.log_file {
        logging.attach_file(log_file)?;
    }

    let mut bar: BoxedProgressBar<I::Item> = match config.log_format {
        LogFormat::Json => Box::new(JsonProgressBar::new(
            iterator,
            config.epoch,
            config.prefix.as_deref(),
            config.log_interval,
            logging.clone(),
        )),
    };

    if let Some(logdir) = &config.tensorboard_logdir {
        bar = Box::new(TensorboardProgressBarWrapper::new(bar, logdir));
    }

    if let Some(project) = &config.tracker_project {
        bar = Box::new(TrackerProgressBarWrapper::new(
            bar,
            tracker,
            project,
            config.tracker_run_name.as_deref(),
        )?);
    }

    Ok(bar)
}
