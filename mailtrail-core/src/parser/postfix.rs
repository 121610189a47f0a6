//! Postfix syslog grammar.
//!
//! Every line is `<syslog header> postfix/<daemon>[pid]: <QUEUEID>: <text>`.
//! The daemons that matter for a message's fate:
//!
//! - `pickup` / `qmgr`: `from=<...>` when the message enters the queue
//! - `cleanup`: `message-id=<...>`, the key back to the sent message
//! - `smtp` / `local` / `pipe` / `virtual`: `to=<...>, ..., status=...`
//! - `bounce`: `sender non-delivery notification: <QUEUEID>`
//! - `qmgr`: `removed` once the queue entry is gone

use super::{
    cursor::{self, Cursor},
    syslog,
};
use crate::{Direction, LogLine};

pub(crate) fn parse(raw: &str) -> LogLine {
    parse_line(raw).unwrap_or_else(|| LogLine::unparseable(raw))
}

fn parse_line(raw: &str) -> Option<LogLine> {
    let header = syslog::split(raw.trim_end())?;
    let (service, daemon) = header.program.rsplit_once('/')?;
    if !service.starts_with("postfix") {
        return None;
    }

    let mut words = Cursor::new(header.message);
    let queue_id = words.next()?.strip_suffix(':')?;
    if !is_queue_id(queue_id) {
        return None;
    }

    let line = LogLine::in_transaction(raw, Some(header.timestamp), queue_id);
    Some(classify(line, daemon, words.rest()))
}

fn classify(mut line: LogLine, daemon: &str, text: &str) -> LogLine {
    if text == "removed" {
        return line.with_direction(Direction::Removed);
    }

    if let Some(value) = text.strip_prefix("message-id=") {
        line.referenced_message_id = Cursor::new(value)
            .next()
            .map(|id| cursor::strip_angle(id.trim_end_matches(',')))
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        return line.with_direction(Direction::InboundAccept);
    }

    if text.starts_with("to=") {
        return delivery(line, text);
    }

    if daemon == "bounce"
        && let Some((_, queue_id)) = text.split_once("non-delivery notification:")
    {
        line.related_transaction_id = Cursor::new(queue_id)
            .next()
            .filter(|id| is_queue_id(id))
            .map(str::to_string);
        return line.with_direction(Direction::BouncedNotify);
    }

    let accepted = text.starts_with("from=<")
        || (text.starts_with("uid=") && text.contains(" from=<"));
    if accepted {
        return line.with_direction(Direction::InboundAccept);
    }

    line
}

/// `to=<a@b>, relay=..., delay=..., dsn=2.0.0, status=sent (250 2.0.0 Ok: queued as X)`
fn delivery(mut line: LogLine, text: &str) -> LogLine {
    let Some((_, after)) = text.split_once("status=") else {
        return line;
    };

    let mut words = Cursor::new(after);
    let status = words.next().unwrap_or_default().trim_end_matches(',');
    let detail = words
        .rest()
        .strip_prefix('(')
        .map(|detail| detail.rsplit_once(')').map_or(detail, |(inner, _)| inner));

    if let Some(detail) = detail {
        line.reply_code = cursor::reply_code(detail);
    }

    let direction = match status {
        "sent" => {
            line.related_transaction_id = detail
                .and_then(cursor::handoff_id)
                .filter(|id| is_queue_id(id))
                .map(str::to_string);
            Direction::OutboundRelay
        }
        "deferred" => Direction::Deferred,
        "bounced" | "expired" => Direction::BouncedNotify,
        _ => Direction::Unparseable,
    };

    line.with_direction(direction)
}

/// Short ids are upper-case hex (`CB55836EE58C`); long ids mix case
/// (`4Xyz1234abczABCD`). Both contain at least one digit, which keeps
/// `warning:` and `NOQUEUE:` out.
pub(crate) fn is_queue_id(word: &str) -> bool {
    (5..=32).contains(&word.len())
        && word.bytes().all(|b| b.is_ascii_alphanumeric())
        && word.bytes().any(|b| b.is_ascii_digit())
}
