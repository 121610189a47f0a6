//! Shared helpers for the log correlation tests

use chrono::{TimeZone, Utc};
use mailtrail_core::{LogLine, LogWindow, SendAttempt};

pub const REQUEST_EMAIL: &str = "request-313973-1650c56a@localhost";
pub const BODY_EMAIL: &str = "foi@body.example.com";
pub const MESSAGE_ID: &str = "ogm-14+537f69734b97c-1ebd@localhost";

/// A window over `log`, one entry per line.
pub fn window(log: &[&str]) -> LogWindow {
    LogWindow::from_lines(log.iter().copied())
}

pub fn attempt(message_identifier: &str) -> SendAttempt {
    SendAttempt::submitted(
        message_identifier,
        Utc.with_ymd_and_hms(2015, 10, 30, 19, 24, 16).unwrap(),
    )
}

/// Raw text of `lines`, for comparing against the fixture.
pub fn raws(lines: &[LogLine]) -> Vec<&str> {
    lines.iter().map(LogLine::raw).collect()
}

/// The fixture lines at `positions`.
pub fn pick<'a>(log: &[&'a str], positions: &[usize]) -> Vec<&'a str> {
    positions.iter().map(|&position| log[position]).collect()
}
