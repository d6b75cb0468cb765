//! Logging macros for ergonomic message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`. Structured fields
//! still go through the method API; the macros cover the message-only case.
//!
//! # Examples
//!
//! ```
//! use rust_log_router::info;
//! use rust_log_router::sinks::capture;
//!
//! let (logger, records) = capture::scoped("server");
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! assert_eq!(records.len(), 2);
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_log_router::sinks::capture;
/// # let (logger, _records) = capture::scoped("t");
/// use rust_log_router::{log, Severity};
/// log!(logger, Severity::Info, "Simple message");
/// log!(logger, Severity::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $severity:expr, $($arg:tt)+) => {
        $logger.log($severity, &format!($($arg)+), Vec::new())
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_router::sinks::capture;
/// # let (logger, _records) = capture::scoped("t");
/// use rust_log_router::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_router::sinks::capture;
/// # let (logger, _records) = capture::scoped("t");
/// use rust_log_router::info;
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_router::sinks::capture;
/// # let (logger, _records) = capture::scoped("t");
/// use rust_log_router::warn;
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_router::sinks::capture;
/// # let (logger, _records) = capture::scoped("t");
/// use rust_log_router::error;
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Error, $($arg)+)
    };
}

/// Log a fatal-level message. Terminates the process under the logger's
/// default fatal behavior.
///
/// # Examples
///
/// ```
/// # use rust_log_router::sinks::capture;
/// # let (logger, _records) = capture::scoped("t");
/// use rust_log_router::fatal;
/// fatal!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatal(&format!($($arg)+), Vec::new())
    };
}
