//! Structured logging for RelayBot
//!
//! Provides a small, ergonomic logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via --debug-<module> flags
//! - Dual output: colored console + append-only log file
//!
//! ## Usage
//!
//! ```rust
//! use relaybot::logger::{self, LogTag};
//!
//! logger::info(LogTag::Engine, "Message handled");
//! logger::debug(LogTag::Cache, "Claimed 3 new addresses"); // Only with --debug-cache
//! ```
//!
//! Call `logger::init()` once at startup before any logging occurs.

mod format;
mod levels;
mod tags;

pub use levels::LogLevel;
pub use tags::LogTag;

use crate::arguments;

/// Initialize the logger system
///
/// Scans command-line arguments for debug flags and opens the log file.
pub fn init() {
    format::init_file_logging();
}

/// Check if a log message should be displayed
///
/// Filtering rules:
/// 1. Errors, warnings and info are always shown
/// 2. Debug level requires the --debug-<module> flag for that tag
/// 3. Verbose level requires the global --verbose flag
fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    match level {
        LogLevel::Error | LogLevel::Warning | LogLevel::Info => true,
        LogLevel::Debug => tag.is_debug_enabled() || arguments::is_verbose_enabled(),
        LogLevel::Verbose => arguments::is_verbose_enabled(),
    }
}

fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }
    format::format_and_log(tag, level, message);
}

/// Log at ERROR level (critical issues, always shown)
pub fn error(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues)
pub fn warning(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (detailed diagnostics, gated by --debug-<module>)
pub fn debug(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (very detailed tracing, gated by --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Verbose, message);
}
