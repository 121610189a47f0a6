//! Configuration for log parsing and correlation.
//!
//! Loaded from RON by the embedding application:
//!
//! ```ron
//! (
//!     mta_log_type: "postfix",
//!     correlation: (
//!         max_handoff_depth: 4,
//!         max_window_lines: Some(500000),
//!     ),
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::MtaFormat;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Which mail server wrote the log being scanned.
    ///
    /// Unsupported values are rejected while deserializing.
    ///
    /// Default: `exim`
    #[serde(default)]
    pub mta_log_type: MtaFormat,

    /// Correlation limits.
    #[serde(default)]
    pub correlation: CorrelationConfig,
}

/// Limits applied while correlating a message against a log window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Maximum number of indirect-router hops followed from a seed
    /// transaction. `0` disables handoff following entirely.
    ///
    /// Default: 8
    #[serde(default = "defaults::max_handoff_depth")]
    pub max_handoff_depth: usize,

    /// Keep only the newest N lines of a window.
    ///
    /// Default: unbounded
    #[serde(default)]
    pub max_window_lines: Option<usize>,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            max_handoff_depth: defaults::max_handoff_depth(),
            max_window_lines: None,
        }
    }
}

mod defaults {
    pub const fn max_handoff_depth() -> usize {
        8
    }
}
