use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_core::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Layer, registry};

/// Default target of the records emitted by the progress bars.
pub const DEFAULT_TARGET: &str = "burn_progress";

/// Logging context shared by the progress bars built from it.
///
/// Every line emitted through the context goes to the [log] facade under the requested target,
/// and is appended to each file attached with [attach_file](LoggingContext::attach_file).
/// Cloning the context shares its sinks.
#[derive(Clone)]
pub struct LoggingContext {
    state: Rc<RefCell<LoggingState>>,
}

struct LoggingState {
    target: String,
    files: Vec<FileSink>,
}

struct FileSink {
    path: PathBuf,
    writer: RollingFileAppender,
}

impl Default for LoggingContext {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}

impl LoggingContext {
    /// Create a new context with the given default target.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            state: Rc::new(RefCell::new(LoggingState {
                target: target.into(),
                files: Vec::new(),
            })),
        }
    }

    /// The target used when a record has no explicit one.
    pub fn target(&self) -> String {
        self.state.borrow().target.clone()
    }

    /// Attach a file receiving every line emitted from now on.
    ///
    /// Attaching the same path twice is a no-op. Files stay attached for the lifetime of the
    /// context.
    pub fn attach_file(&self, file_path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = file_path.as_ref();
        let mut state = self.state.borrow_mut();

        if state.files.iter().any(|sink| sink.path == path) {
            return Ok(());
        }

        let file_name = path.file_name().ok_or_else(|| {
            std::io::Error::other(format!(
                "The path '{}' should point to a file.",
                path.display()
            ))
        })?;
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let writer = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(file_name.to_string_lossy())
            .build(directory)
            .map_err(std::io::Error::other)?;

        log::debug!("Attached log file '{}'", path.display());
        state.files.push(FileSink {
            path: path.to_path_buf(),
            writer,
        });

        Ok(())
    }

    /// Paths of the attached files.
    pub fn files(&self) -> Vec<PathBuf> {
        self.state
            .borrow()
            .files
            .iter()
            .map(|sink| sink.path.clone())
            .collect()
    }

    /// Emit a line at the info level.
    pub fn emit(&self, target: Option<&str>, line: &str) -> std::io::Result<()> {
        let mut state = self.state.borrow_mut();
        let target = target.unwrap_or(state.target.as_str()).to_string();

        log::info!(target: target.as_str(), "{line}");

        for sink in state.files.iter_mut() {
            writeln!(sink.writer, "{line}")?;
        }

        Ok(())
    }

    /// Flush every attached file.
    pub fn flush(&self) -> std::io::Result<()> {
        let mut state = self.state.borrow_mut();

        for sink in state.files.iter_mut() {
            sink.writer.flush()?;
        }

        Ok(())
    }
}

/// If a global tracing subscriber is not already configured, set up logging to a file,
/// and add our custom panic hook.
///
/// Returns whether the subscriber was installed.
pub fn install_file_logger(file_path: impl AsRef<Path>) -> bool {
    let path = file_path.as_ref();
    let Some(file_name) = path.file_name() else {
        log::warn!("The path '{}' should point to a file.", path.display());
        return false;
    };
    let writer = tracing_appender::rolling::never(
        path.parent().unwrap_or_else(|| Path::new(".")),
        file_name,
    );
    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(LevelFilter::INFO);

    if registry().with(layer).try_init().is_ok() {
        update_panic_hook(path);
        return true;
    }

    false
}

/// If a global tracing subscriber is not already configured, log to the standard error.
///
/// Returns whether the subscriber was installed.
pub fn install_console_logger() -> bool {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::INFO);

    registry().with(layer).try_init().is_ok()
}

fn update_panic_hook(file_path: &Path) {
    let hook = std::panic::take_hook();
    let file_path = file_path.display().to_string();

    std::panic::set_hook(Box::new(move |info| {
        log::error!("PANIC => {info}");
        eprintln!(
            "=== PANIC ===\nA fatal error happened, you can check the experiment logs here => \
             '{file_path}'\n============="
        );
        hook(info);
    }));
}
