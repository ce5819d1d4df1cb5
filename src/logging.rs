//! Logging infrastructure.
//!
//! This module provides optional tracing-based logging with support for:
//! - Multiple output targets (stderr, file)
//! - Configurable log levels
//! - Selectable format (text or JSON)
//!
//! Logging is off unless a level is set; the library never writes to the
//! terminal on its own.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a log level from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Convert to a filter string for tracing-subscriber.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

impl LogFormat {
    /// Parse a log format from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Default)]
pub struct LogConfig {
    /// Log level (None means logging is disabled).
    pub level: Option<LogLevel>,
    /// Output file path (None means stderr).
    pub file: Option<PathBuf>,
    /// Output format.
    pub format: LogFormat,
}

impl LogConfig {
    /// Reads logging configuration from the environment:
    /// `AZDO_WORKITEMS_LOG_LEVEL`, `AZDO_WORKITEMS_LOG_FILE`, and
    /// `AZDO_WORKITEMS_LOG_FORMAT`. An unset or unparseable level leaves
    /// logging disabled.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            level: std::env::var("AZDO_WORKITEMS_LOG_LEVEL")
                .ok()
                .and_then(|s| LogLevel::parse(&s)),
            file: std::env::var("AZDO_WORKITEMS_LOG_FILE")
                .ok()
                .map(PathBuf::from),
            format: std::env::var("AZDO_WORKITEMS_LOG_FORMAT")
                .ok()
                .and_then(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
        }
    }
}

/// Guard that must be held to ensure logs are flushed.
///
/// When this guard is dropped, all pending log messages are flushed.
/// Hold this until application exit.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
    _stderr_guard: Option<WorkerGuard>,
}

/// Initialize the logging system.
///
/// Returns `Some(LogGuard)` if logging was initialized, `None` if logging is
/// disabled. The guard must be held until application exit to ensure logs
/// are flushed.
///
/// # Example
///
/// ```rust,no_run
/// use azdo_workitems::logging::{LogConfig, LogLevel, LogFormat, init_logging};
/// use std::path::PathBuf;
///
/// let config = LogConfig {
///     level: Some(LogLevel::Debug),
///     file: Some(PathBuf::from("/tmp/azdo-workitems.log")),
///     format: LogFormat::Text,
/// };
///
/// let _guard = init_logging(config);
/// // Logging is now active, _guard keeps it alive
/// ```
#[must_use = "the returned guard must be held until application exit"]
pub fn init_logging(config: LogConfig) -> Option<LogGuard> {
    let level = config.level?;

    // Filter to this crate only (avoid noise from dependencies)
    let filter = EnvFilter::new(format!("azdo_workitems={}", level.as_filter_str()));

    let mut guards = LogGuard {
        _file_guard: None,
        _stderr_guard: None,
    };

    match &config.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            guards._file_guard = Some(guard);

            match config.format {
                LogFormat::Json => {
                    let layer = fmt::layer()
                        .with_writer(non_blocking)
                        .json()
                        .with_span_events(FmtSpan::CLOSE)
                        .with_file(true)
                        .with_line_number(true);

                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer)
                        .init();
                }
                LogFormat::Text => {
                    let layer = fmt::layer()
                        .with_writer(non_blocking)
                        .with_target(true)
                        .with_level(true)
                        .with_file(true)
                        .with_line_number(true);

                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer)
                        .init();
                }
            }
        }

        None => {
            let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
            guards._stderr_guard = Some(guard);

            match config.format {
                LogFormat::Json => {
                    let layer = fmt::layer()
                        .with_writer(non_blocking)
                        .json()
                        .with_span_events(FmtSpan::CLOSE);

                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer)
                        .init();
                }
                LogFormat::Text => {
                    let layer = fmt::layer()
                        .with_writer(non_blocking)
                        .with_target(true)
                        .with_level(true)
                        .compact();

                    tracing_subscriber::registry()
                        .with(filter)
                        .with(layer)
                        .init();
                }
            }
        }
    }

    Some(guards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// # Test: Log Level Parsing
    ///
    /// Verifies that log levels are parsed correctly from strings.
    ///
    /// ## Test Scenario
    /// - Parse valid log level strings (case-insensitive)
    /// - Parse invalid log level strings
    ///
    /// ## Expected Outcome
    /// - Valid strings return the corresponding LogLevel
    /// - Invalid strings return None
    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("TRACE"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("warn"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("error"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("invalid"), None);
        assert_eq!(LogLevel::parse(""), None);
    }

    /// # Test: Log Format Parsing
    ///
    /// Verifies that log formats are parsed correctly from strings.
    ///
    /// ## Test Scenario
    /// - Parse valid format strings (case-insensitive)
    /// - Parse invalid format strings
    ///
    /// ## Expected Outcome
    /// - Valid strings return the corresponding LogFormat
    /// - Invalid strings return None
    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::parse("text"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parse("TEXT"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("yaml"), None);
        assert_eq!(LogFormat::parse(""), None);
    }

    /// # Test: Config from Environment
    ///
    /// Verifies that logging configuration is read from environment
    /// variables.
    ///
    /// ## Test Scenario
    /// - Set level, file, and format variables, then read the config
    /// - Clear them and read again
    ///
    /// ## Expected Outcome
    /// - Set variables map onto the config; unset variables leave logging
    ///   disabled with the default format
    #[test]
    #[serial]
    fn test_config_from_env() {
        unsafe {
            std::env::set_var("AZDO_WORKITEMS_LOG_LEVEL", "debug");
            std::env::set_var("AZDO_WORKITEMS_LOG_FILE", "/tmp/azdo-test.log");
            std::env::set_var("AZDO_WORKITEMS_LOG_FORMAT", "json");
        }

        let config = LogConfig::from_env();
        assert_eq!(config.level, Some(LogLevel::Debug));
        assert_eq!(config.file, Some(PathBuf::from("/tmp/azdo-test.log")));
        assert_eq!(config.format, LogFormat::Json);

        unsafe {
            std::env::remove_var("AZDO_WORKITEMS_LOG_LEVEL");
            std::env::remove_var("AZDO_WORKITEMS_LOG_FILE");
            std::env::remove_var("AZDO_WORKITEMS_LOG_FORMAT");
        }

        let config = LogConfig::from_env();
        assert!(config.level.is_none());
        assert!(config.file.is_none());
        assert_eq!(config.format, LogFormat::Text);
    }

    /// # Test: Logging Disabled by Default
    ///
    /// Verifies that logging is disabled when no level is specified.
    ///
    /// ## Test Scenario
    /// - Create config with no log level
    ///
    /// ## Expected Outcome
    /// - init_logging returns None
    #[test]
    fn test_logging_disabled_by_default() {
        let config = LogConfig {
            level: None,
            file: None,
            format: LogFormat::Text,
        };
        // init_logging can only be exercised once per process because of the
        // global subscriber; the disabled path returns before touching it.
        assert!(init_logging(config).is_none());
    }

    /// # Test: Log Level Filter String
    ///
    /// Verifies that log levels are converted to correct filter strings.
    ///
    /// ## Test Scenario
    /// - Convert each LogLevel to filter string
    ///
    /// ## Expected Outcome
    /// - Each level produces the correct lowercase string
    #[test]
    fn test_log_level_filter_string() {
        assert_eq!(LogLevel::Trace.as_filter_str(), "trace");
        assert_eq!(LogLevel::Debug.as_filter_str(), "debug");
        assert_eq!(LogLevel::Info.as_filter_str(), "info");
        assert_eq!(LogLevel::Warn.as_filter_str(), "warn");
        assert_eq!(LogLevel::Error.as_filter_str(), "error");
    }
}
