//! Log formatting and output with ANSI colors
//!
//! Handles colorized console output plus plain-text append to the log file.

use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use once_cell::sync::Lazy;
use std::fs::{File, OpenOptions};
use std::io::{stdout, ErrorKind, Write};
use std::sync::Mutex;

/// Log format widths for alignment
const TAG_WIDTH: usize = 10;
const LEVEL_WIDTH: usize = 8;

/// Log file next to the binary, appended across runs
const LOG_FILE: &str = "relaybot.log";

static LOG_FILE_HANDLE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

/// Open the log file for appending. Failure is non-fatal; console output
/// still works without a file handle.
pub fn init_file_logging() {
    let handle = OpenOptions::new().create(true).append(true).open(LOG_FILE);
    if let Ok(mut guard) = LOG_FILE_HANDLE.lock() {
        *guard = handle.ok();
    }
}

/// Format and output a log message to console and file
pub fn format_and_log(tag: LogTag, level: LogLevel, message: &str) {
    let now = Local::now();
    let time = now.format("%H:%M:%S").to_string();

    let console_line = format!(
        "{} [{}] [{}] {}",
        time.dimmed(),
        format_tag(&tag),
        format_level(level),
        message
    );
    print_stdout_safe(&console_line);

    let file_line = format!(
        "{} [{}] [{}] {}",
        now.format("%Y-%m-%d %H:%M:%S"),
        tag.as_str(),
        level.as_str(),
        message
    );
    write_to_file(&file_line);
}

/// Format a tag with appropriate color
fn format_tag(tag: &LogTag) -> ColoredString {
    let padded = format!("{:<width$}", tag.as_str(), width = TAG_WIDTH);
    match tag {
        LogTag::System => padded.bright_yellow().bold(),
        LogTag::Engine => padded.bright_green().bold(),
        LogTag::Patterns => padded.bright_white().bold(),
        LogTag::Cache => padded.bright_cyan().bold(),
        LogTag::Dispatch => padded.bright_magenta().bold(),
        LogTag::Relay => padded.bright_blue().bold(),
        LogTag::Persist => padded.bright_cyan().bold(),
        LogTag::Telegram => padded.bright_blue().bold(),
        LogTag::Test => padded.white().bold(),
    }
}

/// Format a level with appropriate color
fn format_level(level: LogLevel) -> ColoredString {
    let padded = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);
    match level {
        LogLevel::Error => padded.bright_red().bold(),
        LogLevel::Warning => padded.bright_yellow().bold(),
        _ => padded.white().bold(),
    }
}

/// Print to stdout but ignore broken pipe errors
fn print_stdout_safe(message: &str) {
    if let Err(e) = writeln!(stdout(), "{}", message) {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        let _ = writeln!(std::io::stderr(), "Logger stdout error: {}", e);
    }
    if let Err(e) = stdout().flush() {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
    }
}

fn write_to_file(line: &str) {
    if let Ok(mut guard) = LOG_FILE_HANDLE.lock() {
        if let Some(ref mut file) = *guard {
            let _ = writeln!(file, "{}", line);
        }
    }
}
