//! Log line grammars.
//!
//! Parsing is total: any input produces a [`LogLine`], and a line that no
//! grammar recognises comes back as [`Direction::Unparseable`](crate::Direction::Unparseable)
//! with its raw text intact.

mod cursor;
mod exim;
mod postfix;
mod syslog;

use crate::{LogLine, MtaFormat};

/// Parse one line of a mail server log written by `format`.
///
/// ```
/// use mailtrail_core::{Direction, MtaFormat, parse};
///
/// let line = parse(
///     "2015-10-30 19:24:16 [17814] 1ZsFHb-0004dK-SM Completed",
///     MtaFormat::Exim,
/// );
/// assert_eq!(line.direction(), Direction::Removed);
/// assert_eq!(line.transaction_id(), Some("1ZsFHb-0004dK-SM"));
/// ```
pub fn parse(raw: &str, format: MtaFormat) -> LogLine {
    match format {
        MtaFormat::Exim => exim::parse(raw),
        MtaFormat::Postfix => postfix::parse(raw),
    }
}

/// Strip one pair of angle brackets from a stored message identifier.
///
/// Identifiers recorded by older senders kept the brackets of the
/// `Message-ID` header, while log lines are parsed without them.
pub(crate) fn normalise_message_id(id: &str) -> &str {
    cursor::strip_angle(id.trim())
}
