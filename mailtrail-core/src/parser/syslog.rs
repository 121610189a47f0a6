//! Syslog header splitting.
//!
//! Postfix always logs through syslog and Exim can be configured to. Two
//! header shapes are common:
//!
//! ```text
//! Jun 15 16:02:40 host postfix/qmgr[5216]: BA6A236F4E08: removed
//! 2024-06-15T16:02:40.123456+00:00 host postfix/qmgr[5216]: BA6A236F4E08: removed
//! ```

use chrono::{DateTime, NaiveTime};
use phf::phf_map;

use super::cursor::Cursor;
use crate::LogTimestamp;

static MONTHS: phf::Map<&'static str, u32> = phf_map! {
    "Jan" => 1,
    "Feb" => 2,
    "Mar" => 3,
    "Apr" => 4,
    "May" => 5,
    "Jun" => 6,
    "Jul" => 7,
    "Aug" => 8,
    "Sep" => 9,
    "Oct" => 10,
    "Nov" => 11,
    "Dec" => 12,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SyslogHeader<'a> {
    pub(crate) timestamp: LogTimestamp,
    /// Tag without the pid, e.g. `postfix/smtp` or `exim`.
    pub(crate) program: &'a str,
    /// Everything after the `tag:` separator.
    pub(crate) message: &'a str,
}

pub(crate) fn split(line: &str) -> Option<SyslogHeader<'_>> {
    let mut cursor = Cursor::new(line);
    let first = cursor.next()?;

    let timestamp = if let Some(&month) = MONTHS.get(first) {
        let day = cursor.next()?.parse::<u32>().ok()?;
        let time = NaiveTime::parse_from_str(cursor.next()?, "%H:%M:%S").ok()?;
        if !(1..=31).contains(&day) {
            return None;
        }
        LogTimestamp::YearLess { month, day, time }
    } else {
        LogTimestamp::Exact(DateTime::parse_from_rfc3339(first).ok()?.naive_local())
    };

    let _host = cursor.next()?;
    let tag = cursor.next()?.strip_suffix(':')?;
    let program = match tag.split_once('[') {
        Some((program, pid)) => {
            pid.strip_suffix(']')?.parse::<u32>().ok()?;
            program
        }
        None => tag,
    };

    if program.is_empty() {
        return None;
    }

    Some(SyslogHeader {
        timestamp,
        program,
        message: cursor.rest(),
    })
}
