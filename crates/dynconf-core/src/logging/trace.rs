//! Trace file for change delivery
//!
//! Change events are applied on the remote adapter's delivery thread, where
//! nothing a `Registry` logger prints is guaranteed to be seen. Setting
//! `DYNCONF_DEBUG=1` appends those events to `<tmp>/dynconf-trace.log`, one
//! line per event tagged with the delivering thread. `DYNCONF_LOG_LEVEL`
//! raises the threshold.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::level::LogLevel;

pub(crate) struct TraceFile {
    file: Option<File>,
    min_level: LogLevel,
}

impl TraceFile {
    fn from_env() -> Self {
        let enabled = std::env::var("DYNCONF_DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if !enabled {
            return Self::disabled();
        }
        let min_level = std::env::var("DYNCONF_LOG_LEVEL")
            .map(|v| LogLevel::parse(&v))
            .unwrap_or(LogLevel::Trace);
        Self::open(&trace_file_path(), min_level)
    }

    fn disabled() -> Self {
        Self {
            file: None,
            min_level: LogLevel::Error,
        }
    }

    pub(crate) fn open(path: &Path, min_level: LogLevel) -> Self {
        let file = OpenOptions::new().create(true).append(true).open(path).ok();
        Self { file, min_level }
    }

    pub(crate) fn accepts(&self, level: LogLevel) -> bool {
        self.file.is_some() && level >= self.min_level
    }

    pub(crate) fn write(&mut self, level: LogLevel, target: &str, message: &str) {
        if !self.accepts(level) {
            return;
        }
        let Some(file) = self.file.as_mut() else {
            return;
        };

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let thread = std::thread::current();
        let thread = thread.name().unwrap_or("unnamed");

        // A lost trace line is not worth failing a config update over
        let _ = writeln!(file, "{} {:<5} [{}] {}: {}", millis, level, thread, target, message);
    }
}

static TRACE: Lazy<Mutex<TraceFile>> = Lazy::new(|| Mutex::new(TraceFile::from_env()));

/// Where `DYNCONF_DEBUG=1` sends trace lines
pub fn trace_file_path() -> PathBuf {
    std::env::temp_dir().join("dynconf-trace.log")
}

/// Whether a line at `level` would be written; lets callers skip formatting
pub fn enabled(level: LogLevel) -> bool {
    TRACE.lock().accepts(level)
}

pub fn log(level: LogLevel, target: &str, message: &str) {
    TRACE.lock().write(level, target, message);
}

pub fn trace(target: &str, message: &str) {
    log(LogLevel::Trace, target, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_threshold_filters_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.log");
        let mut sink = TraceFile::open(&path, LogLevel::Debug);

        assert!(!sink.accepts(LogLevel::Trace));
        sink.write(LogLevel::Trace, "registry", "dropped");
        sink.write(LogLevel::Warn, "registry", "kept");
        drop(sink);

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("dropped"));
        assert!(written.contains("WARN"));
        assert!(written.contains("registry: kept"));
    }

    #[test]
    fn test_disabled_sink_accepts_nothing() {
        let sink = TraceFile::disabled();
        assert!(!sink.accepts(LogLevel::Error));
        assert!(trace_file_path().ends_with("dynconf-trace.log"));
    }
}
