// logging.rs - Leveled logging through an injected sink
// The core never owns process-wide logging state: every pipeline receives
// a `&dyn LogSink` from its caller.

use parking_lot::Mutex;

/// Log levels (ordered by severity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// Errors - failures that abort a run
    Error = 0,
    /// Warnings - suspicious input that is still processed
    Warn = 1,
    /// Info - run progress and result summaries
    Info = 2,
    /// Debug - per-stage detail
    Debug = 3,
    /// Trace - per-document decisions
    Trace = 4,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<LogLevel> {
        match s.to_uppercase().as_str() {
            "ERROR" => Some(LogLevel::Error),
            "WARN" => Some(LogLevel::Warn),
            "INFO" => Some(LogLevel::Info),
            "DEBUG" => Some(LogLevel::Debug),
            "TRACE" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            LogLevel::Error => "❌",
            LogLevel::Warn => "⚠️",
            LogLevel::Info => "ℹ️",
            LogLevel::Debug => "🔍",
            LogLevel::Trace => "📝",
        }
    }
}

/// Destination for leveled log messages
///
/// Implementations decide both filtering (`enabled`) and output (`log`).
/// The logging macros check `enabled` before formatting, so a disabled
/// level costs one virtual call.
pub trait LogSink {
    fn enabled(&self, level: LogLevel) -> bool;

    fn log(&self, level: LogLevel, module: &str, message: &str);
}

/// Level-gated sink printing to stderr
#[derive(Debug, Clone, Copy)]
pub struct StderrSink {
    level: LogLevel,
}

impl StderrSink {
    pub fn new(level: LogLevel) -> Self {
        StderrSink { level }
    }
}

impl Default for StderrSink {
    fn default() -> Self {
        StderrSink::new(LogLevel::Info)
    }
}

impl LogSink for StderrSink {
    #[inline]
    fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level
    }

    fn log(&self, level: LogLevel, module: &str, message: &str) {
        if self.enabled(level) {
            eprintln!("{} [{}] {}: {}", level.icon(), level.as_str(), module, message);
        }
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn enabled(&self, _level: LogLevel) -> bool {
        false
    }

    fn log(&self, _level: LogLevel, _module: &str, _message: &str) {}
}

/// Sink that keeps every message in memory (all levels)
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of captured (level, message) pairs
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().clone()
    }

    /// Messages captured at exactly `level`
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn enabled(&self, _level: LogLevel) -> bool {
        true
    }

    fn log(&self, level: LogLevel, _module: &str, message: &str) {
        self.entries.lock().push((level, message.to_string()));
    }
}

#[doc(hidden)]
pub fn log_message(sink: &dyn LogSink, level: LogLevel, module: &str, message: &str) {
    sink.log(level, module, message);
}

/// Log an error message
#[macro_export]
macro_rules! log_error {
    ($sink:expr, $($arg:tt)*) => {
        if $sink.enabled($crate::logging::LogLevel::Error) {
            $crate::logging::log_message(
                $sink,
                $crate::logging::LogLevel::Error,
                module_path!(),
                &format!($($arg)*)
            )
        }
    };
}

/// Log a warning message
#[macro_export]
macro_rules! log_warn {
    ($sink:expr, $($arg:tt)*) => {
        if $sink.enabled($crate::logging::LogLevel::Warn) {
            $crate::logging::log_message(
                $sink,
                $crate::logging::LogLevel::Warn,
                module_path!(),
                &format!($($arg)*)
            )
        }
    };
}

/// Log an info message
#[macro_export]
macro_rules! log_info {
    ($sink:expr, $($arg:tt)*) => {
        if $sink.enabled($crate::logging::LogLevel::Info) {
            $crate::logging::log_message(
                $sink,
                $crate::logging::LogLevel::Info,
                module_path!(),
                &format!($($arg)*)
            )
        }
    };
}

/// Log a debug message
#[macro_export]
macro_rules! log_debug {
    ($sink:expr, $($arg:tt)*) => {
        if $sink.enabled($crate::logging::LogLevel::Debug) {
            $crate::logging::log_message(
                $sink,
                $crate::logging::LogLevel::Debug,
                module_path!(),
                &format!($($arg)*)
            )
        }
    };
}

/// Log a trace message
#[macro_export]
macro_rules! log_trace {
    ($sink:expr, $($arg:tt)*) => {
        if $sink.enabled($crate::logging::LogLevel::Trace) {
            $crate::logging::log_message(
                $sink,
                $crate::logging::LogLevel::Trace,
                module_path!(),
                &format!($($arg)*)
            )
        }
    };
}
