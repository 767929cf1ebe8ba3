//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels
//! - Console output
//! - JSON log files with daily or hourly rotation
//!
//! # Example
//!
//! ```no_run
//! use ferry::logging::init_logging;
//! use ferry::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! // Use tracing macros for logging
//! tracing::info!("Application started");
//! tracing::error!(error = "Something went wrong", "Error occurred");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log the start of an export operation
///
/// # Example
///
/// ```no_run
/// use ferry::log_export_start;
/// use ferry::domain::TimeWindow;
///
/// let window = TimeWindow::last_updated(chrono::Utc::now());
/// log_export_start!(window, 4);
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($window:expr, $combinations:expr) => {
        tracing::info!(
            window = %$window,
            combinations = $combinations,
            "Starting export"
        );
    };
}

/// Log the completion of an export operation
///
/// # Example
///
/// ```no_run
/// use ferry::log_export_complete;
/// use std::time::Duration;
///
/// let count = 42;
/// let duration = Duration::from_secs(10);
/// log_export_complete!(count, duration);
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($count:expr, $duration:expr) => {
        tracing::info!(
            count = $count,
            duration_ms = $duration.as_millis() as u64,
            "Export completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use ferry::log_error_with_context;
/// use ferry::domain::FerryError;
///
/// let error = FerryError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::{FerryError, TimeWindow};
    use std::time::Duration;

    #[test]
    fn test_macros_expand_without_subscriber() {
        let window = TimeWindow::last_updated(chrono::Utc::now());
        crate::log_export_start!(window, 2);
        crate::log_export_complete!(10usize, Duration::from_millis(5));
        crate::log_error_with_context!(
            &FerryError::Validation("bad".to_string()),
            "validating input"
        );
    }
}
