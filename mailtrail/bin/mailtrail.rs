//! Trace outgoing messages through Exim and Postfix logs
//!
//! This tool answers "what happened to this email?" from the mail server's
//! own log:
//! - `trace`: every log line and queue transaction of one message
//! - `status`: one delivery verdict per message of a send history
//! - `parse`: how each log line is classified

use std::path::PathBuf;

use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use mailtrail::{config, ingest, logging};
use mailtrail_core::{
    Config, DeliveryReport, MailLog, MtaFormat, SendAttempt, SendHistory, parse,
};

/// Trace outgoing messages through mail server logs
#[derive(Parser, Debug)]
#[command(name = "mailtrail")]
#[command(about = "Correlate outgoing messages with Exim and Postfix logs", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (RON); overrides MAILTRAIL_CONFIG and the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log format (exim or postfix); overrides `mta_log_type` from the configuration
    #[arg(short, long, global = true)]
    mta: Option<MtaFormat>,

    /// Log files, oldest first. Reads stdin when none are given
    #[arg(short, long = "log", global = true)]
    logs: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show every log line belonging to one message
    Trace {
        /// Message identifier of each send attempt, oldest first
        #[arg(long = "message-id", required = true)]
        message_ids: Vec<String>,
    },
    /// Show the delivery status of every message in a send history
    Status {
        /// Send history file (RON map of message key to attempts)
        #[arg(long)]
        history: PathBuf,
    },
    /// Show how each log line is classified
    Parse,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Output {
    Text,
    Ron,
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = Cli::parse();

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(mta) = cli.mta {
        config.mta_log_type = mta;
    }

    let window = ingest::read_window(&cli.logs, config.correlation.max_window_lines)?;

    match cli.command {
        Commands::Trace { message_ids } => {
            let attempts: Vec<_> = message_ids
                .into_iter()
                .map(|id| SendAttempt::submitted(id, Utc::now()))
                .collect();
            let log = MailLog::parse(&window, config.mta_log_type);
            let report = log.assess(&attempts, &config.correlation);
            print_trace(&log, &report, cli.output)?;
        }
        Commands::Status { history } => {
            let history = ingest::load_history(&history)?;
            let log = MailLog::parse(&window, config.mta_log_type);
            cmd_status(&log, &history, &config, cli.output)?;
        }
        Commands::Parse => {
            cmd_parse(window.iter(), config.mta_log_type, cli.output)?;
        }
    }

    Ok(())
}

fn print_trace(log: &MailLog, report: &DeliveryReport, output: Output) -> anyhow::Result<()> {
    match output {
        Output::Ron => println!("{}", to_ron(report)?),
        Output::Text => {
            for line in &report.lines {
                println!("{line}");
            }
            if !report.lines.is_empty() {
                println!();
            }
            println!("Format: {}", log.format());
            println!("Transactions: {}", report.transaction_ids.join(", "));
            println!(
                "Status: {} ({})",
                report.status,
                report.status.description()
            );
            if !report.status.is_final() {
                println!("This status may change as the mail server logs more activity");
            }
            if report.submission_failed {
                println!("The most recent send failed before reaching the mail server");
            }
        }
    }

    Ok(())
}

fn cmd_status(
    log: &MailLog,
    history: &impl SendHistory,
    config: &Config,
    output: Output,
) -> anyhow::Result<()> {
    let reports: Vec<_> = history
        .messages()
        .into_iter()
        .map(|message| {
            let report = log.assess(&history.attempts(&message), &config.correlation);
            (message, report)
        })
        .collect();

    match output {
        Output::Ron => println!("{}", to_ron(&reports)?),
        Output::Text => {
            println!(
                "{:<32} {:<10} {:<6} {:<10}",
                "MESSAGE", "STATUS", "FINAL", "SUBMISSION"
            );
            println!("{}", "-".repeat(61));
            for (message, report) in &reports {
                let submission = if report.submission_failed { "failed" } else { "ok" };
                let is_final = if report.status.is_final() { "yes" } else { "no" };
                println!(
                    "{message:<32} {:<10} {is_final:<6} {submission:<10}",
                    report.status.as_str()
                );
            }
            println!("\nTotal: {} message(s)", reports.len());
        }
    }

    Ok(())
}

fn cmd_parse<'a>(
    raw_lines: impl Iterator<Item = &'a str>,
    format: MtaFormat,
    output: Output,
) -> anyhow::Result<()> {
    // Classic syslog headers carry no year; assume the logs are current.
    let year = Utc::now().year();

    for raw in raw_lines {
        let line = parse(raw, format);
        match output {
            Output::Ron => println!("{}", ron::to_string(&line)?),
            Output::Text => println!(
                "{:<19} {:<15} {:<24} {:<4} {}",
                line.timestamp()
                    .and_then(|timestamp| timestamp.with_year(year))
                    .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d %H:%M:%S").to_string()),
                line.direction().as_str(),
                line.transaction_id().unwrap_or("-"),
                line.reply_code().map_or_else(|| "-".to_string(), |code| code.to_string()),
                line.raw()
            ),
        }
    }

    Ok(())
}

fn to_ron(value: &impl serde::Serialize) -> anyhow::Result<String> {
    ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
        .map_err(|e| anyhow::anyhow!("Failed to serialize output: {e}"))
}
