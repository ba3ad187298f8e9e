use super::{BarState, ProgressBar, display_epoch};
use crate::{
    CountingIterator, LoggingContext, ProgressError,
    stat::{Stat, Stats, TensorValue, format_stat},
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io;

/// Progress bar logging one JSON object per line.
///
/// Intermediate stats are only logged every `log_interval` steps, while end-of-epoch stats are
/// always logged.
pub struct JsonProgressBar<I> {
    iterable: CountingIterator<I>,
    state: BarState,
    log_interval: usize,
    logging: LoggingContext,
}

impl<I: Iterator> JsonProgressBar<I> {
    /// Create a new JSON progress bar.
    ///
    /// # Arguments
    ///
    /// * `iterable` - The items of the epoch.
    /// * `epoch` - The current epoch, starting at 1.
    /// * `prefix` - Text displayed after the epoch.
    /// * `log_interval` - Number of steps between two intermediate log lines, 0 disables them.
    /// * `logging` - Where the lines are emitted.
    pub fn new(
        iterable: CountingIterator<I>,
        epoch: Option<usize>,
        prefix: Option<&str>,
        log_interval: usize,
        logging: LoggingContext,
    ) -> Self {
        Self {
            state: BarState::new(iterable.n(), epoch, prefix),
            iterable,
            log_interval,
            logging,
        }
    }

    fn format_stats<'a>(
        &self,
        stats: impl Iterator<Item = (String, &'a Stat)>,
        update: Option<f64>,
    ) -> Map<String, Value> {
        let mut postfix = Map::new();

        if let Some(epoch) = self.state.epoch {
            postfix.insert("epoch".to_string(), epoch.into());
        }
        if let Some(update) = update {
            postfix.insert("update".to_string(), update.into());
        }
        for (key, stat) in stats {
            postfix.insert(key, stat_to_json(stat));
        }

        postfix
    }

    fn emit(&self, postfix: &Map<String, Value>, tag: Option<&str>) -> Result<(), ProgressError> {
        let mut line = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut line, LineFormatter);
        postfix.serialize(&mut serializer)?;

        let line = String::from_utf8_lossy(&line);
        self.logging.emit(tag, &line)?;

        Ok(())
    }
}

/// Integer and list tensors keep their JSON type, every other stat is formatted as a string.
fn stat_to_json(stat: &Stat) -> Value {
    match stat {
        Stat::Tensor(TensorValue::Int(value)) => (*value).into(),
        Stat::Tensor(TensorValue::List(values)) => values.clone().into(),
        _ => format_stat(stat).into(),
    }
}

impl<I: Iterator> Iterator for JsonProgressBar<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state.size.is_none() {
            self.state.size = Some(self.length());
        }

        let item = self.iterable.next()?;
        self.state.i = Some(self.iterable.n() - 1);

        Some(item)
    }
}

impl<I: Iterator> ProgressBar for JsonProgressBar<I> {
    fn state(&self) -> &BarState {
        &self.state
    }

    fn length(&self) -> usize {
        self.iterable.total()
    }

    fn log(
        &mut self,
        stats: &Stats,
        tag: Option<&str>,
        step: Option<u64>,
    ) -> Result<(), ProgressError> {
        let step = step
            .filter(|step| *step > 0)
            .or(self.state.i.map(|i| i as u64))
            .unwrap_or(0);

        if step == 0 || self.log_interval == 0 || step % self.log_interval as u64 != 0 {
            return Ok(());
        }

        let stats = stats.iter().map(|(key, stat)| (key.to_string(), stat));
        let postfix = self.format_stats(stats, display_epoch(&self.state));

        self.emit(&postfix, tag)
    }

    fn print(
        &mut self,
        stats: &Stats,
        tag: Option<&str>,
        _step: Option<u64>,
    ) -> Result<(), ProgressError> {
        let stats = stats.iter().map(|(key, stat)| match tag {
            Some(tag) => (format!("{tag}_{key}"), stat),
            None => (key.to_string(), stat),
        });
        let postfix = self.format_stats(stats, None);

        self.emit(&postfix, tag)
    }

    fn close(&mut self) {
        if let Err(err) = self.logging.flush() {
            log::error!("Failed to flush the log files: {err}");
        }
    }
}

/// Writes JSON with a space after each separator, e.g. `{"epoch": 1, "loss": "2.5"}`.
struct LineFormatter;

impl serde_json::ser::Formatter for LineFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meter::AverageMeter;

    struct Fixture {
        _dir: tempfile::TempDir,
        file: std::path::PathBuf,
        logging: LoggingContext,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let file = dir.path().join("train.log");
            let logging = LoggingContext::default();
            logging.attach_file(&file).unwrap();

            Self {
                _dir: dir,
                file,
                logging,
            }
        }

        fn lines(&self) -> Vec<String> {
            self.logging.flush().unwrap();
            std::fs::read_to_string(&self.file)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    #[test]
    fn test_iteration_updates_state() {
        let fixture = Fixture::new();
        let mut bar = JsonProgressBar::new(
            CountingIterator::new(vec!['a', 'b', 'c']),
            Some(1),
            None,
            1,
            fixture.logging.clone(),
        );

        assert_eq!(bar.length(), 3);
        assert_eq!(bar.state().size, None);
        assert_eq!(bar.next(), Some('a'));
        assert_eq!(bar.state().size, Some(3));
        assert_eq!(bar.state().i, Some(0));
        assert_eq!(bar.by_ref().last(), Some('c'));
        assert_eq!(bar.state().i, Some(2));
    }

    #[test]
    fn test_iteration_resumes_at_offset() {
        let fixture = Fixture::new();
        let mut bar = JsonProgressBar::new(
            CountingIterator::new(0..10).with_offset(6),
            Some(2),
            Some("train"),
            1,
            fixture.logging.clone(),
        );

        assert_eq!(bar.state().n, 6);
        assert_eq!(bar.prefix(), "epoch 002 | train");
        assert_eq!(bar.next(), Some(6));
        assert_eq!(bar.state().i, Some(6));
    }

    #[test]
    fn test_log_every_interval() {
        let fixture = Fixture::new();
        let mut bar = JsonProgressBar::new(
            CountingIterator::new(0..4),
            Some(1),
            None,
            2,
            fixture.logging.clone(),
        );

        while let Some(item) = bar.next() {
            let stats = Stats::new()
                .with("loss", AverageMeter::from_iter([item as f64, 2.0]))
                .with("num_updates", item + 1);
            bar.log(&stats, Some("train"), Some(item as u64 + 1))
                .unwrap();
        }

        assert_eq!(
            fixture.lines(),
            vec![
                r#"{"epoch": 1, "update": 0.5, "loss": "1.500", "num_updates": "2"}"#,
                r#"{"epoch": 1, "update": 1.0, "loss": "2.500", "num_updates": "4"}"#,
            ]
        );
    }

    #[test]
    fn test_log_uses_position_without_step() {
        let fixture = Fixture::new();
        let mut bar = JsonProgressBar::new(
            CountingIterator::new(0..4),
            None,
            None,
            3,
            fixture.logging.clone(),
        );

        bar.log(&Stats::new().with("loss", 1.0), None, None).unwrap();
        bar.nth(3);
        bar.log(&Stats::new().with("loss", 0.25), None, None).unwrap();

        assert_eq!(fixture.lines(), vec![r#"{"loss": "0.25"}"#]);
    }

    #[test]
    fn test_print_renames_keys_with_tag() {
        let fixture = Fixture::new();
        let mut bar = JsonProgressBar::new(
            CountingIterator::new(0..4),
            Some(3),
            None,
            100,
            fixture.logging.clone(),
        );
        let stats = Stats::new()
            .with("loss", 2.0)
            .with("ppl", TensorValue::Float(3.14159))
            .with("tokens", TensorValue::Int(1024))
            .with("hist", TensorValue::List(vec![0.5, 1.0]));

        bar.print(&stats, Some("valid"), None).unwrap();
        bar.print(&Stats::new().with("loss", 2.0), None, None).unwrap();

        assert_eq!(
            fixture.lines(),
            vec![
                r#"{"epoch": 3, "valid_loss": "2", "valid_ppl": "3.14", "valid_tokens": 1024, "valid_hist": [0.5, 1.0]}"#,
                r#"{"epoch": 3, "loss": "2"}"#,
            ]
        );
    }
}
