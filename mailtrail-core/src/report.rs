//! Everything known about one outgoing message, for display.

use serde::Serialize;

use crate::{DeliveryStatus, LogLine, SendAttempt, reduce, transaction_ids};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Matched lines in log order, raw text intact.
    pub lines: Vec<LogLine>,
    /// Transactions touched, in first-seen order.
    pub transaction_ids: Vec<String>,
    /// The verdict derived from `lines`.
    pub status: DeliveryStatus,
    /// Whether the newest attempt failed before reaching the mail server.
    ///
    /// This is independent of `status`: a failed resend after a delivered
    /// first send reports both.
    pub submission_failed: bool,
}

impl DeliveryReport {
    /// Build a report from lines already matched to `attempts`.
    pub fn new(lines: Vec<LogLine>, attempts: &[SendAttempt]) -> Self {
        Self {
            transaction_ids: transaction_ids(&lines),
            status: reduce(&lines, attempts),
            submission_failed: attempts.last().is_some_and(SendAttempt::is_known_failed),
            lines,
        }
    }
}
