//! Mail server log correlation and delivery status inference
//!
//! This crate provides functionality to:
//! - Parse Exim and Postfix log lines into structured records
//! - Find every log line belonging to an outgoing message, across resends
//!   and local handoffs between queue transactions
//! - Reduce those lines to a single delivery verdict
//!
//! ```
//! use chrono::Utc;
//! use mailtrail_core::{
//!     CorrelationConfig, DeliveryStatus, LogWindow, MailLog, MtaFormat, SendAttempt,
//! };
//!
//! let window = LogWindow::from_lines([
//!     "2015-10-30 19:24:16 [17814] 1ZsFHb-0004dK-SM <= r@localhost U=alaveteli P=local S=2252 id=ogm-14+537f69734b97c-1ebd@localhost",
//!     "2015-10-30 19:24:16 [17817] 1ZsFHb-0004dK-SM => foi@example.com R=dnslookup T=remote_smtp C=\"250 ok 1446233056 qp 26062\"",
//!     "2015-10-30 19:24:16 [17817] 1ZsFHb-0004dK-SM Completed QT=1s",
//! ]);
//! let attempts = [SendAttempt::submitted("ogm-14+537f69734b97c-1ebd@localhost", Utc::now())];
//!
//! let log = MailLog::parse(&window, MtaFormat::Exim);
//! let report = log.assess(&attempts, &CorrelationConfig::default());
//!
//! assert_eq!(report.status, DeliveryStatus::Delivered);
//! assert_eq!(report.transaction_ids, ["1ZsFHb-0004dK-SM"]);
//! ```
//!
//! Nothing here fails on bad input. Lines that are not understood are kept
//! as [`Direction::Unparseable`], and a message with nothing usable in the
//! log is [`DeliveryStatus::Unknown`].

mod attempt;
pub mod config;
mod correlate;
mod error;
mod format;
mod history;
mod line;
mod parser;
mod report;
mod status;
mod window;

pub use attempt::{SendAttempt, SendOutcome};
pub use config::{Config, CorrelationConfig};
pub use correlate::{MailLog, correlate, transaction_ids};
pub use error::MailLogError;
pub use format::MtaFormat;
pub use history::{MemorySendHistory, SendHistory};
pub use line::{Direction, LogLine, LogTimestamp};
pub use parser::parse;
pub use report::DeliveryReport;
pub use status::{DeliveryStatus, reduce};
pub use window::{LogWindow, LogWindowBuilder};
