//! Command line companion to `mailtrail-core`.
//!
//! This crate provides functionality to:
//! - Discover and load the RON configuration
//! - Read mail server logs and send histories from disk or stdin
//! - Initialise logging for the `mailtrail` binary

pub mod config;
pub mod ingest;
pub mod logging;
