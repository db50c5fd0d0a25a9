//! Console logger

use super::level::LogLevel;
use super::traits::Logger;
use crate::remote::ClientOptions;

/// Prints registry messages at or above a threshold
///
/// Everything goes to stderr unless `to_stdout` is set, matching the
/// `log_stdout` switch of `ClientOptions`.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
    min_level: LogLevel,
    to_stdout: bool,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self {
            prefix: "[dynconf]".to_string(),
            min_level: LogLevel::Debug,
            to_stdout: false,
        }
    }

    /// Follow the level and stdout switch the remote client was given
    pub fn from_options(options: &ClientOptions) -> Self {
        Self {
            min_level: LogLevel::parse(&options.log_level),
            to_stdout: options.log_stdout,
            ..Self::new()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    fn format(&self, level: LogLevel, message: &str) -> Option<String> {
        (level >= self.min_level).then(|| format!("{} {}: {}", self.prefix, level, message))
    }

    fn emit(&self, level: LogLevel, message: &str) {
        let Some(line) = self.format(level, message) else {
            return;
        };
        if self.to_stdout {
            println!("{}", line);
        } else {
            eprintln!("{}", line);
        }
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        self.emit(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.emit(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.emit(LogLevel::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_options() {
        let options = ClientOptions::default().with_log_level("warn");
        let logger = ConsoleLogger::from_options(&options);
        assert_eq!(logger.min_level, LogLevel::Warn);
        assert!(logger.to_stdout);

        assert!(logger.format(LogLevel::Info, "registered svc").is_none());
        assert_eq!(
            logger.format(LogLevel::Error, "connect failed").unwrap(),
            "[dynconf] ERROR: connect failed"
        );
    }

    #[test]
    fn test_prefix_and_threshold() {
        let logger = ConsoleLogger::new()
            .with_prefix("[svc]")
            .with_min_level(LogLevel::Info);
        assert!(logger.format(LogLevel::Debug, "x").is_none());
        assert_eq!(logger.format(LogLevel::Info, "up").unwrap(), "[svc] INFO: up");
    }
}
