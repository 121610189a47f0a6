//! Reading log windows and send histories from disk.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use mailtrail_core::{LogWindow, MemorySendHistory, SendAttempt};
use tracing::debug;

/// Read `paths` in order into one window, or stdin when `paths` is empty.
///
/// Files are concatenated as given; rotated logs must be passed oldest
/// first.
///
/// # Errors
///
/// Fails if a file cannot be opened or read.
pub fn read_window(paths: &[PathBuf], max_lines: Option<usize>) -> anyhow::Result<LogWindow> {
    let mut builder = LogWindow::builder().with_max_lines(max_lines);

    if paths.is_empty() {
        let read = builder
            .read_from(io::stdin().lock())
            .map_err(|e| anyhow::anyhow!("Failed to read log from stdin: {e}"))?;
        debug!("Read {read} line(s) from stdin");
    }

    for path in paths {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open log {}: {e}", path.display()))?;
        let read = builder
            .read_from(BufReader::new(file))
            .map_err(|e| anyhow::anyhow!("Failed to read log {}: {e}", path.display()))?;
        debug!("Read {read} line(s) from {}", path.display());
    }

    Ok(builder.build())
}

/// Load a send history written as a RON map from message key to attempts:
///
/// ```ron
/// {
///     "request-313973": [
///         (message_identifier: "ogm-14+537f69734b97c-1ebd@localhost", sent_at: "2016-02-03T06:58:56Z"),
///         (message_identifier: "ogm-15+56b3a50ac0cf4-6717@localhost", sent_at: "2016-02-04T09:12:00Z", outcome: known_failed),
///     ],
/// }
/// ```
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub fn load_history(path: &Path) -> anyhow::Result<MemorySendHistory> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        anyhow::anyhow!("Failed to read send history from {}: {e}", path.display())
    })?;

    let messages: BTreeMap<String, Vec<SendAttempt>> = ron::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid send history in {}: {e}", path.display()))?;

    Ok(messages.into_iter().collect())
}
