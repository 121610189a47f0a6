//! Structured form of a single mail server log line.

use core::fmt::{self, Display, Formatter};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::DeliveryStatus;

/// What a log line says happened to the message in its transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// The message entered the local queue.
    InboundAccept,
    /// A delivery attempt left the queue for one recipient.
    OutboundRelay,
    /// The transaction finished and its queue entry was removed.
    Removed,
    /// Delivery was postponed after a temporary failure.
    Deferred,
    /// Delivery failed permanently, or a non-delivery report was generated.
    BouncedNotify,
    /// Anything we do not understand.
    Unparseable,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InboundAccept => "inbound_accept",
            Self::OutboundRelay => "outbound_relay",
            Self::Removed => "removed",
            Self::Deferred => "deferred",
            Self::BouncedNotify => "bounced_notify",
            Self::Unparseable => "unparseable",
        }
    }

    /// Lines that report the fate of a delivery attempt.
    #[must_use]
    pub const fn is_outcome(self) -> bool {
        matches!(
            self,
            Self::OutboundRelay | Self::Deferred | Self::BouncedNotify
        )
    }
}

impl Display for Direction {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// Leading timestamp of a log line.
///
/// Classic syslog headers carry no year, so those are kept as they were
/// written and resolved by the caller once a year is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogTimestamp {
    Exact(NaiveDateTime),
    YearLess {
        month: u32,
        day: u32,
        time: NaiveTime,
    },
}

impl LogTimestamp {
    /// Resolve the timestamp against `year`. Exact timestamps ignore it.
    ///
    /// Returns `None` when the day does not exist in that year (Feb 29).
    #[must_use]
    pub fn with_year(self, year: i32) -> Option<NaiveDateTime> {
        match self {
            Self::Exact(at) => Some(at),
            Self::YearLess { month, day, time } => {
                NaiveDate::from_ymd_opt(year, month, day).map(|date| date.and_time(time))
            }
        }
    }
}

impl Display for LogTimestamp {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(at) => write!(fmt, "{}", at.format("%Y-%m-%d %H:%M:%S")),
            Self::YearLess { month, day, time } => {
                write!(fmt, "{month:02}-{day:02} {}", time.format("%H:%M:%S"))
            }
        }
    }
}

/// One raw log line and everything derived from it.
///
/// All derived fields are a pure function of the raw text and the log
/// format; the raw text is never altered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    raw: String,
    pub(crate) timestamp: Option<LogTimestamp>,
    pub(crate) transaction_id: Option<String>,
    pub(crate) referenced_message_id: Option<String>,
    pub(crate) direction: Direction,
    pub(crate) reply_code: Option<u16>,
    pub(crate) related_transaction_id: Option<String>,
}

impl LogLine {
    /// A line that matched no known grammar.
    pub(crate) fn unparseable(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            timestamp: None,
            transaction_id: None,
            referenced_message_id: None,
            direction: Direction::Unparseable,
            reply_code: None,
            related_transaction_id: None,
        }
    }

    /// A line that belongs to `transaction_id` but whose content is not yet
    /// classified.
    pub(crate) fn in_transaction(
        raw: &str,
        timestamp: Option<LogTimestamp>,
        transaction_id: &str,
    ) -> Self {
        Self {
            timestamp,
            transaction_id: Some(transaction_id.to_string()),
            ..Self::unparseable(raw)
        }
    }

    pub(crate) const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// The line exactly as it appeared in the log.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub const fn timestamp(&self) -> Option<LogTimestamp> {
        self.timestamp
    }

    /// The MTA queue id, e.g. `1ZsFHb-0004dK-SM` or `CB55836EE58C`.
    #[must_use]
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    /// The `Message-ID` carried by an acceptance line, without angle brackets.
    #[must_use]
    pub fn referenced_message_id(&self) -> Option<&str> {
        self.referenced_message_id.as_deref()
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// SMTP reply code reported for an outbound attempt, if the line has one.
    #[must_use]
    pub const fn reply_code(&self) -> Option<u16> {
        self.reply_code
    }

    /// Another transaction this line points at.
    ///
    /// For a relay this is the queue id the next hop assigned (`id=...` or
    /// `queued as ...` in the reply). For an Exim bounce notification it is
    /// the transaction that bounced. For a Postfix bounce notification it is
    /// the queue id of the generated report.
    #[must_use]
    pub fn related_transaction_id(&self) -> Option<&str> {
        self.related_transaction_id.as_deref()
    }

    /// The delivery verdict this line supports on its own, if any.
    ///
    /// Relays without a reply code are local or pipe deliveries, which the
    /// MTAs only log once they succeed.
    #[must_use]
    pub const fn outcome(&self) -> Option<DeliveryStatus> {
        match self.direction {
            Direction::InboundAccept => Some(DeliveryStatus::Sent),
            Direction::OutboundRelay => match self.reply_code {
                None | Some(200..=299) => Some(DeliveryStatus::Delivered),
                Some(400..=499) => Some(DeliveryStatus::Deferred),
                Some(500..=599) => Some(DeliveryStatus::Failed),
                Some(_) => None,
            },
            Direction::Deferred => Some(DeliveryStatus::Deferred),
            Direction::BouncedNotify => Some(DeliveryStatus::Failed),
            Direction::Removed | Direction::Unparseable => None,
        }
    }
}

impl Display for LogLine {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.write_str(&self.raw)
    }
}
