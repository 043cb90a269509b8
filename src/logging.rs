// src/logging.rs
//! Logging setup and the per-run logging handle.
//!
//! The binary installs log4rs once at startup. Library code logs through a
//! [`RunLogger`], which forwards to the global logger unless a run was
//! built with its own sink, so embedding callers and tests can observe a
//! run's messages without touching global state.

use log::{Level, LevelFilter, Log, Record};
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

const LOG_TARGET: &str = "confluence_export";

/// Handle a run logs through.
#[derive(Clone, Default)]
pub struct RunLogger {
    sink: Option<Arc<dyn Log>>,
}

impl RunLogger {
    /// Forwards to whatever logger is installed globally.
    pub fn global() -> Self {
        Self { sink: None }
    }

    /// Sends every record to `sink` instead of the global logger.
    pub fn with_sink(sink: Arc<dyn Log>) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let record = Record::builder()
            .args(args)
            .level(level)
            .target(LOG_TARGET)
            .build();

        match &self.sink {
            Some(sink) => {
                if sink.enabled(record.metadata()) {
                    sink.log(&record);
                }
            }
            None => {
                if level <= log::max_level() {
                    log::logger().log(&record);
                }
            }
        }
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }
}

impl fmt::Debug for RunLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.sink.is_some() { "custom" } else { "global" };
        f.debug_struct("RunLogger").field("sink", &kind).finish()
    }
}

/// Sets up console and file logging.
///
/// The console shows `level` and above; the file always records debug
/// output so a failed run can be diagnosed afterwards.
pub fn setup_logging(
    level: LevelFilter,
    log_file_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if level >= LevelFilter::Debug {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "[{l}] {m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(log_file_path)?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("stderr", Box::new(stderr_appender)),
        )
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(level.max(LevelFilter::Debug)),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Parses a configured level name, falling back to `info`.
pub fn parse_level(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or_else(|_| {
        log::warn!("Unknown log level '{}', using info", name);
        LevelFilter::Info
    })
}
