use burn_progress::{
    CountingIterator, LoggingContext, ProgressBarConfig, ProgressError, build_progress_bar,
    bar::ProgressBar,
    install_console_logger,
    meter::{AverageMeter, StopwatchMeter, TimeMeter},
    stat::Stats,
    tracker::{FileTracker, TrackerHandle},
};
use serde_json::json;

const NUM_EPOCHS: usize = 2;
const NUM_BATCHES: usize = 50;

fn main() -> Result<(), ProgressError> {
    install_console_logger();

    let artifact_dir = std::env::temp_dir().join("burn-progress-demo");
    std::fs::create_dir_all(&artifact_dir)?;

    let logging = LoggingContext::default();
    let tracker = TrackerHandle::new(FileTracker::new(artifact_dir.join("tracker")));
    let mut num_updates = 0;

    for epoch in 1..=NUM_EPOCHS {
        let config = ProgressBarConfig::new()
            .with_log_format_str("json")?
            .with_log_interval(10)
            .with_log_file(artifact_dir.join("train.log"))
            .with_epoch(epoch)
            .with_prefix("train")
            .with_tensorboard_logdir(artifact_dir.join("tensorboard"))
            .with_tracker_project("demo");

        let batches = CountingIterator::new(0..NUM_BATCHES);
        let mut bar = build_progress_bar(batches, &config, &logging, Some(tracker.clone()))?.scoped();
        bar.update_config(json!({"lr": 1e-3, "epochs": NUM_EPOCHS}).as_object().unwrap())?;

        let mut loss = AverageMeter::new().with_round(3);
        let wps = TimeMeter::new();
        let mut wall = StopwatchMeter::new();
        wall.start();

        while let Some(batch) = bar.next() {
            num_updates += 1;
            loss.update(1.0 / (batch + epoch) as f64, 1.0);

            let stats = Stats::new()
                .with("loss", loss.clone())
                .with("wps", wps.clone())
                .with("num_updates", num_updates);
            bar.log(&stats, Some("train"), None)?;
        }

        wall.stop(1.0);
        let stats = Stats::new()
            .with("loss", loss)
            .with("wall", wall)
            .with("num_updates", num_updates);
        bar.print(&stats, Some("train"), None)?;
    }

    Ok(())
}
