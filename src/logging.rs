/// Structured logging for the pressure integrity service.
///
/// Provides context-rich logging with segment identifiers, timestamps,
/// and severity levels. Supports both console output and file-based
/// logging for daemon operation.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::chain::ChainVerification;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Component Tags
// ---------------------------------------------------------------------------

/// Which part of the service emitted a log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Scada,
    Chain,
    Filter,
    Database,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Scada => write!(f, "SCADA"),
            Component::Chain => write!(f, "CHAIN"),
            Component::Filter => write!(f, "FILTER"),
            Component::Database => write!(f, "DB"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        *LOGGER.lock().unwrap() = Some(logger);
    }

    /// Log a message with the global logger
    fn log(&self, level: LogLevel, component: &Component, segment_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        let segment_part = segment_id.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp,
            level,
            component,
            segment_part,
            message
        );

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, segment_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, segment_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Log a general informational message
pub fn info(component: Component, segment_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Info, &component, segment_id, message);
    }
}

/// Log a warning message
pub fn warn(component: Component, segment_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Warning, &component, segment_id, message);
    }
}

/// Log an error message
pub fn error(component: Component, segment_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Error, &component, segment_id, message);
    }
}

/// Log a debug message
pub fn debug(component: Component, segment_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Debug, &component, segment_id, message);
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a store failure during a chain operation.
///
/// Transient connectivity faults are warnings (the caller may retry from
/// a fresh tail read); anything else is an error.
pub fn log_store_failure(operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let message = format!("{} failed: {}", operation, error_msg);

    if error_msg.contains("timeout") || error_msg.contains("connection") {
        warn(Component::Database, None, &message);
    } else {
        error(Component::Database, None, &message);
    }
}

/// Log the outcome of a full-chain verification pass.
///
/// An intact chain logs at info; a broken chain logs at error with the
/// full forensic payload — the earliest broken id and the count verified
/// before it are always reported, never abbreviated to a pass/fail.
pub fn log_verification_result(result: &ChainVerification) {
    match result.first_broken_id {
        None => {
            let message = format!(
                "Chain verified: {} readings intact",
                result.records_verified
            );
            info(Component::Chain, None, &message);
        }
        Some(id) => {
            let message = format!(
                "CHAIN BROKEN at ReadingID {} ({} readings verified before break)",
                id, result.records_verified
            );
            error(Component::Chain, None, &message);
        }
    }
}

/// Log a summary of a rebuild operation.
pub fn log_rebuild_summary(updated: usize) {
    let message = format!("Rebuild complete: {} hash signatures recomputed", updated);
    warn(Component::Chain, None, &message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_component_tags_render_as_uppercase_codes() {
        assert_eq!(Component::Chain.to_string(), "CHAIN");
        assert_eq!(Component::Database.to_string(), "DB");
    }

    #[test]
    fn test_operation_reporters_write_full_payload_to_file_sink() {
        use crate::model::PipelineError;

        let path = std::env::temp_dir()
            .join(format!("pipemon_logging_test_{}.log", std::process::id()));
        let path_str = path.to_str().unwrap();
        let _ = std::fs::remove_file(&path);

        init_logger(LogLevel::Debug, Some(path_str), true);

        // A broken chain must log the earliest broken id AND the count
        // verified before it — the forensic payload is never abbreviated
        // to a pass/fail.
        log_verification_result(&ChainVerification {
            is_valid: false,
            first_broken_id: Some(7),
            records_verified: 6,
        });
        log_verification_result(&ChainVerification {
            is_valid: true,
            first_broken_id: None,
            records_verified: 12,
        });
        log_rebuild_summary(4);
        log_store_failure(
            "tail fetch",
            &PipelineError::Store("connection refused".to_string()),
        );

        let contents = std::fs::read_to_string(&path)
            .expect("file sink should have been written");
        assert!(
            contents.contains("CHAIN BROKEN at ReadingID 7"),
            "broken id missing from: {}",
            contents
        );
        assert!(
            contents.contains("6 readings verified before break"),
            "verified count missing from: {}",
            contents
        );
        assert!(contents.contains("Chain verified: 12 readings intact"));
        assert!(contents.contains("Rebuild complete: 4 hash signatures recomputed"));
        assert!(contents.contains("tail fetch failed: Store error: connection refused"));

        let _ = std::fs::remove_file(&path);
    }
}
