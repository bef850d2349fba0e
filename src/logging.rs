//! Log backend for the monitor
//!
//! The core emits `log` records on successful state changes. While the terminal
//! UI owns the screen, records are kept in a bounded ring that the UI drains
//! into its log pane each frame; in batch mode they go straight to stderr.

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Number of formatted records kept before the oldest are dropped
pub const LOG_BUFFER_LINES: usize = 256;

static BUFFER: Mutex<VecDeque<String>> = Mutex::new(VecDeque::new());

/// Where formatted records go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    Buffer,
    Stderr,
}

struct MonitorLogger {
    level: LevelFilter,
    sink: LogSink,
}

impl Log for MonitorLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!(
            "{:<5} {}: {}",
            record.level(),
            record.target(),
            record.args()
        );
        match self.sink {
            LogSink::Stderr => eprintln!("{}", line),
            LogSink::Buffer => push(line),
        }
    }

    fn flush(&self) {}
}

fn push(line: String) {
    // A poisoned lock only means another thread panicked mid-push; keep logging
    let mut buffer = BUFFER.lock().unwrap_or_else(|e| e.into_inner());
    if buffer.len() == LOG_BUFFER_LINES {
        buffer.pop_front();
    }
    buffer.push_back(line);
}

/// Install the logger; `verbosity` counts `-v` flags
pub fn init(verbosity: u8, sink: LogSink) -> Result<(), SetLoggerError> {
    let level = level_for(verbosity);
    log::set_boxed_logger(Box::new(MonitorLogger { level, sink }))?;
    log::set_max_level(level);
    Ok(())
}

/// Take every buffered record
pub fn drain() -> Vec<String> {
    let mut buffer = BUFFER.lock().unwrap_or_else(|e| e.into_inner());
    buffer.drain(..).collect()
}

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Short label used by the log pane
pub fn level_label(line: &str) -> Option<Level> {
    line.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }

    #[test]
    fn installed_logger_buffers_records() {
        init(1, LogSink::Buffer).unwrap();
        assert!(init(1, LogSink::Buffer).is_err());

        log::info!("scheduler idle");
        assert!(drain()
            .iter()
            .any(|line| line.starts_with("INFO") && line.ends_with("scheduler idle")));
    }

    #[test]
    fn labels_parse_back() {
        assert_eq!(level_label("DEBUG kacchi::kernel: x"), Some(Level::Debug));
        assert_eq!(level_label("nonsense"), None);
    }
}
