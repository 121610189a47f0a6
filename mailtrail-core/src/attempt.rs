//! Send attempts recorded by the application that submits the mail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::parser::normalise_message_id;

/// How the local submission of one attempt went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    /// Handed to the MTA. Whatever happened next is in the logs.
    #[default]
    Submitted,
    /// The transport raised an error at submission time; no MTA queue ever
    /// saw the message.
    KnownFailed,
}

/// One send or resend of an outgoing message.
///
/// ```ron
/// (
///     message_identifier: "ogm-14+537f69734b97c-1ebd@localhost",
///     sent_at: "2015-10-30T19:24:16Z",
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SendAttempt {
    /// Message identifier assigned at send time. Every resend gets a new one.
    pub message_identifier: String,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub outcome: SendOutcome,
}

impl SendAttempt {
    pub fn submitted(message_identifier: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self {
            message_identifier: message_identifier.into(),
            sent_at,
            outcome: SendOutcome::Submitted,
        }
    }

    pub fn known_failed(message_identifier: impl Into<String>, sent_at: DateTime<Utc>) -> Self {
        Self {
            message_identifier: message_identifier.into(),
            sent_at,
            outcome: SendOutcome::KnownFailed,
        }
    }

    /// The identifier as it appears in log lines.
    ///
    /// Identifiers stored by older releases kept the surrounding angle
    /// brackets of the header value. `None` when nothing was recorded.
    #[must_use]
    pub fn log_identifier(&self) -> Option<&str> {
        Some(normalise_message_id(&self.message_identifier)).filter(|id| !id.is_empty())
    }

    #[must_use]
    pub const fn is_known_failed(&self) -> bool {
        matches!(self.outcome, SendOutcome::KnownFailed)
    }
}
