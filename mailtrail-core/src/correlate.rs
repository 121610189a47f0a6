//! Message to transaction correlation.
//!
//! A message is found in the log through the `Message-ID` its acceptance
//! line carries. From those seed transactions the correlator follows local
//! handoffs: an Exim router that re-injects the message, or a relay to a
//! content filter that queues it again, logs the next queue id in the
//! acceptance reply (`C="250 OK id=1cNiyG-00040U-Ls"`,
//! `status=sent (250 2.0.0 Ok: queued as B7F313A054)`). When that id has an
//! acceptance line in the same window the next transaction belongs to the
//! message too.

use std::{
    collections::{BTreeSet, VecDeque},
    sync::Arc,
};

use ahash::{AHashMap, AHashSet};
use tracing::{debug, trace};

use crate::{
    CorrelationConfig, DeliveryReport, Direction, LogLine, LogWindow, MtaFormat, SendAttempt,
    parse,
};

#[derive(Debug, Default)]
struct Index {
    /// Line positions of every transaction, in log order.
    transactions: AHashMap<String, Vec<usize>>,
    /// Transactions accepted with a given message id, in first-seen order.
    message_ids: AHashMap<String, Vec<String>>,
    /// Transactions with at least one acceptance line.
    accepted: AHashSet<String>,
    /// Exim bounce notifications, keyed by the transaction that bounced.
    /// Postfix logs its notification inside the bounced transaction and
    /// names the report's queue id instead, so it needs no entry here.
    bounces: AHashMap<String, Vec<usize>>,
}

impl Index {
    fn build(lines: &[LogLine], format: MtaFormat) -> Self {
        let mut index = Self::default();

        for (position, line) in lines.iter().enumerate() {
            let Some(transaction) = line.transaction_id() else {
                continue;
            };

            index
                .transactions
                .entry(transaction.to_string())
                .or_default()
                .push(position);

            match line.direction() {
                Direction::InboundAccept => {
                    index.accepted.insert(transaction.to_string());

                    if let Some(message_id) = line.referenced_message_id() {
                        let seeds = index.message_ids.entry(message_id.to_string()).or_default();
                        if !seeds.iter().any(|seed| seed == transaction) {
                            seeds.push(transaction.to_string());
                        }
                    }
                }
                Direction::BouncedNotify if format == MtaFormat::Exim => {
                    if let Some(bounced) = line.related_transaction_id()
                        && bounced != transaction
                    {
                        index
                            .bounces
                            .entry(bounced.to_string())
                            .or_default()
                            .push(position);
                    }
                }
                _ => {}
            }
        }

        index
    }
}

/// A log window parsed once, ready to correlate any number of messages.
///
/// Cloning is cheap and clones share the parsed lines.
#[derive(Debug, Clone)]
pub struct MailLog {
    format: MtaFormat,
    lines: Arc<[LogLine]>,
    index: Arc<Index>,
}

impl MailLog {
    pub fn parse(window: &LogWindow, format: MtaFormat) -> Self {
        let lines: Arc<[LogLine]> = window.iter().map(|raw| parse(raw, format)).collect();
        let index = Index::build(&lines, format);

        debug!(
            "Parsed {} {format} log line(s): {} transaction(s), {} message id(s)",
            lines.len(),
            index.transactions.len(),
            index.message_ids.len()
        );

        Self {
            format,
            lines,
            index: Arc::new(index),
        }
    }

    #[must_use]
    pub const fn format(&self) -> MtaFormat {
        self.format
    }

    /// Every parsed line, in log order.
    #[must_use]
    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    /// The lines of one transaction, in log order.
    pub fn transaction(&self, transaction_id: &str) -> impl Iterator<Item = &LogLine> {
        self.index
            .transactions
            .get(transaction_id)
            .into_iter()
            .flatten()
            .filter_map(|&position| self.lines.get(position))
    }

    /// Transactions whose acceptance line carries `message_id`.
    pub fn transactions_for(&self, message_id: &str) -> impl Iterator<Item = &str> {
        self.index
            .message_ids
            .get(crate::parser::normalise_message_id(message_id))
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// All lines relevant to any of `attempts`, in log order, without
    /// duplicates.
    pub fn correlate(&self, attempts: &[SendAttempt], config: &CorrelationConfig) -> Vec<LogLine> {
        self.matched_positions(attempts, config)
            .into_iter()
            .filter_map(|position| self.lines.get(position).cloned())
            .collect()
    }

    /// Correlate and reduce in one pass.
    pub fn assess(&self, attempts: &[SendAttempt], config: &CorrelationConfig) -> DeliveryReport {
        DeliveryReport::new(self.correlate(attempts, config), attempts)
    }

    fn matched_positions(
        &self,
        attempts: &[SendAttempt],
        config: &CorrelationConfig,
    ) -> BTreeSet<usize> {
        let mut visited = AHashSet::new();
        let mut queue = VecDeque::new();

        for attempt in attempts {
            let Some(message_id) = attempt.log_identifier() else {
                trace!("Skipping attempt without a logged identifier");
                continue;
            };

            let mut seeds = 0;
            for transaction in self.transactions_for(message_id) {
                seeds += 1;
                if visited.insert(transaction) {
                    queue.push_back((transaction, 0));
                }
            }

            if seeds == 0 {
                debug!("No transaction found for {message_id}");
            }
        }

        let mut positions = BTreeSet::new();

        while let Some((transaction, depth)) = queue.pop_front() {
            let Some(own) = self.index.transactions.get(transaction) else {
                continue;
            };
            positions.extend(own.iter().copied());

            if let Some(bounces) = self.index.bounces.get(transaction) {
                positions.extend(bounces.iter().copied());
            }

            for line in own.iter().filter_map(|&position| self.lines.get(position)) {
                let Some(next) = self.handoff(transaction, line) else {
                    continue;
                };

                if depth >= config.max_handoff_depth {
                    debug!(
                        "Not following handoff {transaction} -> {next}, depth limit {} reached",
                        config.max_handoff_depth
                    );
                    continue;
                }

                if visited.insert(next) {
                    debug!("Following handoff {transaction} -> {next}");
                    queue.push_back((next, depth + 1));
                }
            }
        }

        debug!(
            "Matched {} line(s) in {} transaction(s) for {} attempt(s)",
            positions.len(),
            visited.len(),
            attempts.len()
        );
        positions
    }

    /// The local transaction an outbound relay line handed the message to.
    fn handoff<'a>(&'a self, transaction: &str, line: &'a LogLine) -> Option<&'a str> {
        if line.direction() != Direction::OutboundRelay {
            return None;
        }

        let next = self.index.accepted.get(line.related_transaction_id()?)?;
        (next != transaction).then_some(next.as_str())
    }
}

/// Parse `window` and return every line relevant to `attempts`.
///
/// Handoffs are followed up to the default depth. Use [`MailLog`] to
/// correlate several messages against one window, or to change the limits.
pub fn correlate(attempts: &[SendAttempt], window: &LogWindow, format: MtaFormat) -> Vec<LogLine> {
    MailLog::parse(window, format).correlate(attempts, &CorrelationConfig::default())
}

/// Distinct transaction ids of `lines`, in first-seen order.
pub fn transaction_ids(lines: &[LogLine]) -> Vec<String> {
    let mut seen = AHashSet::new();
    lines
        .iter()
        .filter_map(LogLine::transaction_id)
        .filter(|&transaction| seen.insert(transaction))
        .map(str::to_string)
        .collect()
}
