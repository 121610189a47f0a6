//! Immutable snapshots of raw mail server log lines.
//!
//! The caller owns ingestion. A [`LogWindow`] is what it hands over once a
//! pass starts: lines in log order, never appended to afterwards, and cheap
//! to share between threads.

use std::{borrow::Cow, collections::VecDeque, io::BufRead, sync::Arc};

use tracing::{debug, trace};

use crate::MailLogError;

/// An ordered, read-only sequence of raw log lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogWindow {
    lines: Arc<[String]>,
}

impl LogWindow {
    /// Create a new `LogWindow` builder
    #[must_use]
    pub fn builder() -> LogWindowBuilder {
        LogWindowBuilder::default()
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LogWindow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_lines(iter)
    }
}

/// Builder for `LogWindow`
///
/// Lines are appended in the order they are read. With a line limit set,
/// the oldest lines are dropped as new ones arrive.
#[derive(Debug, Default)]
pub struct LogWindowBuilder {
    lines: VecDeque<String>,
    max_lines: Option<usize>,
    dropped: usize,
}

impl LogWindowBuilder {
    /// Keep only the newest `max_lines` lines
    #[must_use]
    pub fn with_max_lines(mut self, max_lines: Option<usize>) -> Self {
        self.max_lines = max_lines;
        self.enforce_limit();
        self
    }

    /// Append one line
    pub fn push(&mut self, line: impl Into<String>) {
        let mut line = line.into();
        line.truncate(line.trim_end_matches(['\r', '\n']).len());
        self.lines.push_back(line);
        self.enforce_limit();
    }

    /// Append every line of `reader`, returning how many were read.
    ///
    /// Logs are not guaranteed to be UTF-8: Exim copies 8-bit subjects into
    /// `T="..."` verbatim. Invalid sequences are replaced with U+FFFD so only
    /// the affected line loses fidelity.
    ///
    /// # Errors
    ///
    /// Fails with [`MailLogError::Io`] if reading fails. Lines read before
    /// the failure are kept.
    pub fn read_from<R: BufRead>(&mut self, mut reader: R) -> Result<usize, MailLogError> {
        let mut count = 0;
        let mut replaced = 0;
        let mut buffer = Vec::new();

        loop {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }

            let line = String::from_utf8_lossy(&buffer);
            if matches!(line, Cow::Owned(_)) {
                replaced += 1;
            }
            self.push(line.into_owned());
            count += 1;
        }

        if replaced > 0 {
            debug!("{replaced} log line(s) were not valid UTF-8");
        }
        trace!("Read {count} log line(s)");
        Ok(count)
    }

    fn enforce_limit(&mut self) {
        let Some(max_lines) = self.max_lines else {
            return;
        };

        while self.lines.len() > max_lines {
            self.lines.pop_front();
            self.dropped += 1;
        }
    }

    /// Build the final `LogWindow`
    #[must_use]
    pub fn build(self) -> LogWindow {
        if self.dropped > 0 {
            debug!(
                "Log window limited to {} line(s), {} older line(s) dropped",
                self.lines.len(),
                self.dropped
            );
        }

        LogWindow {
            lines: self.lines.into_iter().collect(),
        }
    }
}
