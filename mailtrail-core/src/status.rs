//! Delivery status reduction.

use core::fmt::{self, Display, Formatter};

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Direction, LogLine, SendAttempt};

/// What is currently known about the fate of an outgoing message.
///
/// Variants are ordered by increasing finality.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Unknown,
    Sent,
    Delivered,
    Deferred,
    Failed,
}

impl DeliveryStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Deferred => "deferred",
            Self::Failed => "failed",
        }
    }

    /// Human readable explanation, suitable for showing next to a message.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Unknown => "We could not find any delivery information for this message",
            Self::Sent => "The message was accepted by our mail server",
            Self::Delivered => "The message was accepted by the recipient's mail server",
            Self::Deferred => "Delivery is delayed and the mail server will keep retrying",
            Self::Failed => "The message could not be delivered",
        }
    }

    /// `Delivered` and `Failed` do not change without new log lines.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }
}

impl Display for DeliveryStatus {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// Reduce the matched lines of one message to a single verdict.
///
/// `lines` must be in log order. The newest line with a classifiable outcome
/// wins; lines sharing a timestamp are decided by their position in the log.
/// An acceptance line only counts while its transaction has no outcome line
/// at all, classifiable or not. Delivery processes can flush before the
/// acceptance line is written, so position alone is not enough.
///
/// A message with no matched lines is [`DeliveryStatus::Unknown`] even when
/// a submission is known to have failed. That failure is reported on its
/// own by [`DeliveryReport`](crate::DeliveryReport).
pub fn reduce(lines: &[LogLine], attempts: &[SendAttempt]) -> DeliveryStatus {
    if lines.is_empty() {
        if attempts.iter().any(SendAttempt::is_known_failed) {
            debug!(
                "No log lines for {} attempt(s), submission failure left to the caller",
                attempts.len()
            );
        }
        return DeliveryStatus::Unknown;
    }

    let concluded: AHashSet<_> = lines
        .iter()
        .filter(|line| line.direction().is_outcome())
        .filter_map(LogLine::transaction_id)
        .collect();

    for line in lines.iter().rev() {
        let transaction = line.transaction_id();

        if line.direction() == Direction::InboundAccept
            && transaction.is_some_and(|transaction| concluded.contains(transaction))
        {
            continue;
        }

        if let Some(status) = line.outcome() {
            debug!(
                "Delivery status {status} from {} line of {}",
                line.direction(),
                transaction.unwrap_or("-")
            );
            return status;
        }
    }

    debug!("None of {} matched line(s) were classifiable", lines.len());
    DeliveryStatus::Unknown
}
