//! Error types for the mailtrail-core crate.
//!
//! Parsing, correlation and status reduction are total functions and never
//! fail. The only fallible operations are selecting a log format from a
//! configuration value and reading a log window from an I/O source.

use std::io;

use thiserror::Error;

/// Top-level error type for log handling.
#[derive(Debug, Error)]
pub enum MailLogError {
    /// The configured `mta_log_type` names a mail server we cannot parse.
    #[error("Unsupported MTA log format: {0:?} (expected \"exim\" or \"postfix\")")]
    UnsupportedFormat(String),

    /// Reading raw log lines failed.
    #[error("I/O error while reading mail server log: {0}")]
    Io(#[from] io::Error),
}
