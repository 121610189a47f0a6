//! The record of every send attempt per outgoing message.
//!
//! The application that sends mail owns this record. The core only reads
//! it, through [`SendHistory`], to learn which message identifiers to look
//! for in the log.

use std::sync::Arc;

use ahash::AHashSet;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::SendAttempt;

/// Read access to the send attempts of outgoing messages.
///
/// Attempts are returned in the order they were made.
pub trait SendHistory: Send + Sync {
    /// Every attempt made for `message`. Empty if the message is unknown.
    fn attempts(&self, message: &str) -> Vec<SendAttempt>;

    /// Keys of all messages with at least one attempt, sorted.
    fn messages(&self) -> Vec<String>;

    /// The distinct identifiers `message` was sent with, as they appear in
    /// the log, in first-seen order. Attempts without an identifier are
    /// skipped.
    fn message_identifiers(&self, message: &str) -> Vec<String> {
        let mut seen = AHashSet::new();
        self.attempts(message)
            .iter()
            .filter_map(SendAttempt::log_identifier)
            .filter(|id| seen.insert(id.to_string()))
            .map(str::to_string)
            .collect()
    }
}

/// Append-only in-memory history, safe to share between threads.
#[derive(Debug, Clone, Default)]
pub struct MemorySendHistory {
    attempts: Arc<DashMap<String, Vec<SendAttempt>>>,
}

impl MemorySendHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt that was handed to the mail server.
    pub fn record_sent(
        &self,
        message: impl Into<String>,
        message_identifier: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) {
        self.record(message, SendAttempt::submitted(message_identifier, sent_at));
    }

    /// Record an attempt the mail transport refused at submission.
    pub fn record_failure(
        &self,
        message: impl Into<String>,
        message_identifier: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) {
        self.record(message, SendAttempt::known_failed(message_identifier, sent_at));
    }

    pub fn record(&self, message: impl Into<String>, attempt: SendAttempt) {
        self.attempts
            .entry(message.into())
            .or_default()
            .push(attempt);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<SendAttempt>)> for MemorySendHistory {
    fn from_iter<I: IntoIterator<Item = (K, Vec<SendAttempt>)>>(iter: I) -> Self {
        let history = Self::new();
        for (message, attempts) in iter {
            let message = message.into();
            for attempt in attempts {
                history.record(message.clone(), attempt);
            }
        }
        history
    }
}

impl SendHistory for MemorySendHistory {
    fn attempts(&self, message: &str) -> Vec<SendAttempt> {
        self.attempts
            .get(message)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn messages(&self) -> Vec<String> {
        let mut messages: Vec<_> = self.attempts.iter().map(|entry| entry.key().clone()).collect();
        messages.sort_unstable();
        messages
    }
}
