//! Exim main log grammar.
//!
//! ```text
//! 2015-10-30 19:24:16 [17814] 1ZsFHb-0004dK-SM <= sender U=alaveteli P=local S=2252 id=ogm-14+537f69734b97c-1ebd@localhost ...
//! 2015-10-30 19:24:16 [17817] 1ZsFHb-0004dK-SM => recipient ... C="250 ok 1446233056 qp 26062"
//! 2015-10-30 19:24:16 [17817] 1ZsFHb-0004dK-SM Completed QT=1s
//! ```
//!
//! The pid and the timezone offset are optional log selectors, and the whole
//! line may be wrapped in a syslog header.

use chrono::{NaiveDate, NaiveTime};
use phf::phf_map;

use super::{
    cursor::{self, Cursor},
    syslog,
};
use crate::{Direction, LogLine, LogTimestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    Arrival,
    Delivery,
    Suppressed,
    Deferral,
    Failure,
}

static FLAGS: phf::Map<&'static str, Flag> = phf_map! {
    "<=" => Flag::Arrival,
    "=>" => Flag::Delivery,
    "->" => Flag::Delivery,
    ">>" => Flag::Delivery,
    "*>" => Flag::Suppressed,
    "==" => Flag::Deferral,
    "**" => Flag::Failure,
};

pub(crate) fn parse(raw: &str) -> LogLine {
    let text = raw.trim_end();
    let body = match syslog::split(text) {
        Some(header) if header.program.starts_with("exim") => header.message,
        Some(_) => return LogLine::unparseable(raw),
        None => text,
    };

    parse_body(raw, body).unwrap_or_else(|| LogLine::unparseable(raw))
}

fn parse_body(raw: &str, body: &str) -> Option<LogLine> {
    let mut cursor = Cursor::new(body);
    let date = cursor.next()?;
    let time = cursor.next()?;
    let timestamp = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()?
        .and_time(NaiveTime::parse_from_str(time, "%H:%M:%S%.f").ok()?);

    let mut word = cursor.next()?;
    if is_timezone(word) {
        word = cursor.next()?;
    }
    if is_pid(word) {
        word = cursor.next()?;
    }

    if !is_message_id(word) {
        return None;
    }

    let line = LogLine::in_transaction(raw, Some(LogTimestamp::Exact(timestamp)), word);
    let rest = cursor.rest();
    let mut words = Cursor::new(rest);

    let Some(&flag) = words.next().and_then(|first| FLAGS.get(first)) else {
        return Some(classify_detail(line, rest));
    };

    let line = match flag {
        Flag::Arrival => arrival(line, words.next().unwrap_or_default(), words.rest()),
        Flag::Delivery => delivery(line, words.rest()),
        Flag::Suppressed => line,
        Flag::Deferral => line.with_direction(Direction::Deferred),
        Flag::Failure => line.with_direction(Direction::BouncedNotify),
    };

    Some(line)
}

fn arrival(mut line: LogLine, sender: &str, fields: &str) -> LogLine {
    // Locally generated bounce: `<= <> R=<bounced transaction> ...`
    if sender == "<>" {
        line.related_transaction_id = cursor::field(fields, "R")
            .filter(|id| is_message_id(id))
            .map(str::to_string);
        return line.with_direction(Direction::BouncedNotify);
    }

    line.referenced_message_id = cursor::field(fields, "id")
        .map(cursor::strip_angle)
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    line.with_direction(Direction::InboundAccept)
}

fn delivery(mut line: LogLine, fields: &str) -> LogLine {
    if let Some(reply) = cursor::field(fields, "C") {
        line.reply_code = cursor::reply_code(reply);
        line.related_transaction_id = cursor::handoff_id(reply).map(str::to_string);
    }
    line.with_direction(Direction::OutboundRelay)
}

/// Lines without a flag: queue housekeeping and SMTP error details.
fn classify_detail(mut line: LogLine, rest: &str) -> LogLine {
    if rest.starts_with("Completed") {
        return line.with_direction(Direction::Removed);
    }

    if rest.starts_with("SMTP error from remote mail server") {
        line.reply_code = rest
            .match_indices(": ")
            .find_map(|(at, sep)| cursor::reply_code(&rest[at + sep.len()..]));

        let direction = match line.reply_code {
            Some(400..=499) => Direction::Deferred,
            Some(500..=599) => Direction::BouncedNotify,
            _ => Direction::Unparseable,
        };
        return line.with_direction(direction);
    }

    line
}

fn is_timezone(word: &str) -> bool {
    word.len() == 5
        && matches!(word.as_bytes()[0], b'+' | b'-')
        && word[1..].bytes().all(|b| b.is_ascii_digit())
}

fn is_pid(word: &str) -> bool {
    word.strip_prefix('[')
        .and_then(|w| w.strip_suffix(']'))
        .is_some_and(|pid| !pid.is_empty() && pid.bytes().all(|b| b.is_ascii_digit()))
}

/// Exim queue ids: `1ZsFHb-0004dK-SM`, or the longer 4.97+ form
/// `1rVxTH-00000000BQf-2Ydw`.
pub(crate) fn is_message_id(word: &str) -> bool {
    let mut parts = word.split('-');
    let (Some(a), Some(b), Some(c), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let shape_ok = matches!((a.len(), b.len(), c.len()), (6, 6, 2) | (6, 11, 4));
    shape_ok
        && [a, b, c]
            .iter()
            .all(|part| part.bytes().all(|byte| byte.is_ascii_alphanumeric()))
}
