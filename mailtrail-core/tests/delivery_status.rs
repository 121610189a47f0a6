//! Delivery verdicts for complete messages
#![allow(clippy::expect_used, clippy::unwrap_used)]

mod support;

use std::thread;

use chrono::Utc;
use mailtrail_core::{
    CorrelationConfig, DeliveryStatus, LogLine, LogWindow, MailLog, MemorySendHistory, MtaFormat,
    SendAttempt, SendHistory, parse, reduce,
};
use pretty_assertions::assert_eq;
use support::{MESSAGE_ID, attempt, pick, raws, window};

const FIRST_ID: &str = "ogm-531356+5704ec7388370-456e@localhost";
const SECOND_ID: &str = "ogm-531356+571a154f7b7c5-2a7e@localhost";

const REDELIVERED: [&str; 6] = [
    "2016-04-06 12:01:07 [14928] 1anlCt-0003sm-LG <= request-326806-hk82iwn7@localhost U=alaveteli P=local S=1923 id=ogm-531356+5704ec7388370-456e@localhost T=\"Freedom of Information request - Some Information\" from <request-326806-hk82iwn7@localhost> for foi@example.net foi@example.net",
    "2016-04-06 12:01:08 [14933] 1anlCt-0003sm-LG ** foi@example.net F=<request-326806-hk82iwn7@localhost>: all relevant MX records point to non-existent hosts",
    "2016-04-06 12:01:08 [14933] 1anlCt-0003sm-LG ** foi@example.net F=<request-326806-hk82iwn7@localhost>: all relevant MX records point to non-existent hosts",
    "2016-04-06 12:01:08 [14935] 1anlCu-0003st-1p <= <> R=1anlCt-0003sm-LG U=Debian-exim P=local S=2934 T=\"Mail delivery failed: returning message to sender\" from <> for request-326806-hk82iwn7@localhost",
    "2016-04-22 13:13:03 [24970] 1atZxH-0006Uk-KF <= request-326806-hk82iwn7@localhost U=alaveteli P=local S=1923 id=ogm-531356+571a154f7b7c5-2a7e@localhost T=\"Freedom of Information request - Some Information\" from <request-326806-hk82iwn7@localhost> for foi@example.net foi@example.net",
    "2016-04-22 13:24:41 [29720] 1atZxH-0006Uk-KF => foi@example.net F=<request-326806-hk82iwn7@localhost> P=<request-326806-hk82iwn7@localhost> R=dnslookup T=remote_smtp S=1975 H=mail.example.net [213.161.89.103]:25 X=TLS1.2:DHE_RSA_AES_256_CBC_SHA256:256 CV=no DN=\"ST=CA,L=CU,O=TREND,OU=IMSVA,CN=IMSVA.TREND\" C=\"250 2.0.0 Ok: queued as 8D6E6AA66C\" QT=11m38s DT=0s",
];

fn exim(log: &[&str]) -> Vec<LogLine> {
    log.iter().map(|line| parse(line, MtaFormat::Exim)).collect()
}

#[test]
fn test_most_recent_parsable_line_wins() {
    let lines = exim(&[
        "2015-10-30 19:24:16 [17814] 1ZsFHb-0004dK-SM <= request-123-abc987@example.net U=alaveteli P=local S=2252 id=ogm-14+537f69734b97c-1ebd@localhost T=\"FOI Request about stuff\" from <request-123-abc987@example.net> for authority@example.com authority@example.com",
        "2015-10-30 19:24:16 [17817] 1ZsFHb-0004dK-SM => authority@example.com F=<request-123-abc987@example.net> P=<request-123-abc987@example.net> R=dnslookup T=remote_smtp S=2297 H=cluster2.gsi.messagelabs.com [127.0.0.1]:25 C=\"250 ok 1446233056 qp 26062 server-4.tower-221.messagelabs.com!1446233056!7679409!1\" QT=1s DT=0s",
        "2015-10-30 19:24:16 [17817] 1ZsFHb-0004dK-SM junk",
    ]);

    assert_eq!(reduce(&lines, &[attempt(MESSAGE_ID)]), DeliveryStatus::Delivered);
}

#[test]
fn test_junk_is_unknown() {
    let lines = exim(&["junk", "garbage"]);
    assert_eq!(reduce(&lines, &[attempt(MESSAGE_ID)]), DeliveryStatus::Unknown);
}

#[test]
fn test_empty_window_is_unknown() {
    let attempts = [attempt(MESSAGE_ID)];
    let report = MailLog::parse(&window(&[]), MtaFormat::Exim)
        .assess(&attempts, &CorrelationConfig::default());

    assert!(report.lines.is_empty());
    assert!(report.transaction_ids.is_empty());
    assert_eq!(report.status, DeliveryStatus::Unknown);
    assert!(!report.submission_failed);
}

#[test]
fn test_bounced_message_fails() {
    let attempts = [attempt(FIRST_ID)];
    let log = MailLog::parse(&window(&REDELIVERED[..4]), MtaFormat::Exim);

    let report = log.assess(&attempts, &CorrelationConfig::default());

    assert_eq!(raws(&report.lines), &REDELIVERED[..4]);
    assert_eq!(report.transaction_ids, ["1anlCt-0003sm-LG", "1anlCu-0003st-1p"]);
    assert_eq!(report.status, DeliveryStatus::Failed);
}

#[test]
fn test_redelivered_message_is_delivered() {
    let attempts = [attempt(FIRST_ID), attempt(SECOND_ID)];
    let log = MailLog::parse(&window(&REDELIVERED), MtaFormat::Exim);

    let report = log.assess(&attempts, &CorrelationConfig::default());

    assert_eq!(raws(&report.lines), REDELIVERED);
    assert_eq!(report.status, DeliveryStatus::Delivered);

    // Reducing the whole window directly gives the same answer.
    assert_eq!(reduce(&exim(&REDELIVERED), &attempts), DeliveryStatus::Delivered);
}

#[test]
fn test_submission_failure_is_reported_separately() {
    let history = MemorySendHistory::new();
    history.record_sent("request-326806", FIRST_ID, Utc::now());
    history.record_failure("request-326806", SECOND_ID, Utc::now());

    let attempts = history.attempts("request-326806");
    let log = MailLog::parse(&window(&REDELIVERED[..4]), MtaFormat::Exim);
    let report = log.assess(&attempts, &CorrelationConfig::default());

    assert_eq!(report.status, DeliveryStatus::Failed);
    assert!(report.submission_failed);

    let only_failed = [SendAttempt::known_failed(SECOND_ID, Utc::now())];
    let report = log.assess(&only_failed, &CorrelationConfig::default());
    assert_eq!(report.status, DeliveryStatus::Unknown);
    assert!(report.submission_failed);
}

#[test]
fn test_history_identifiers_drive_correlation() {
    let history = MemorySendHistory::new();
    history.record_sent("request-326806", format!("<{FIRST_ID}>"), Utc::now());
    history.record_sent("request-326806", SECOND_ID, Utc::now());

    assert_eq!(
        history.message_identifiers("request-326806"),
        [FIRST_ID, SECOND_ID]
    );

    let log = MailLog::parse(&window(&REDELIVERED), MtaFormat::Exim);
    let lines = log.correlate(
        &history.attempts("request-326806"),
        &CorrelationConfig::default(),
    );
    assert_eq!(raws(&lines), pick(&REDELIVERED, &[0, 1, 2, 3, 4, 5]));
}

#[test]
fn test_concurrent_assessment_of_one_snapshot() {
    let log = MailLog::parse(&window(&REDELIVERED), MtaFormat::Exim);
    let config = CorrelationConfig::default();

    let (first, second) = thread::scope(|scope| {
        let first = scope.spawn(|| log.assess(&[attempt(FIRST_ID)], &config));
        let second = scope.spawn(|| log.assess(&[attempt(SECOND_ID)], &config));
        (first.join().unwrap(), second.join().unwrap())
    });

    assert_eq!(first.status, DeliveryStatus::Failed);
    assert_eq!(second.status, DeliveryStatus::Delivered);
    assert_eq!(second.transaction_ids, ["1atZxH-0006Uk-KF"]);
}

#[test]
fn test_latin1_subject_does_not_hide_delivery() {
    let log: &[u8] = b"2015-10-30 19:24:16 [17814] 1ZsFHb-0004dK-SM <= r@localhost U=alaveteli P=local S=2252 id=ogm-14+537f69734b97c-1ebd@localhost\n\
2015-10-30 19:24:16 [17815] 1ZsFHb-0004dK-SM <= r@localhost U=alaveteli P=local S=2252 T=\"Caf\xe9 au lait\"\n\
2015-10-30 19:24:16 [17817] 1ZsFHb-0004dK-SM => foi@example.com R=dnslookup T=remote_smtp C=\"250 ok 1446233056 qp 26062\"\n";

    let mut builder = LogWindow::builder();
    assert_eq!(builder.read_from(log).unwrap(), 3);
    let window = builder.build();

    let report = MailLog::parse(&window, MtaFormat::Exim)
        .assess(&[attempt(MESSAGE_ID)], &CorrelationConfig::default());

    assert_eq!(report.lines.len(), 3);
    assert!(report.lines[1].raw().contains("Caf\u{fffd} au lait"));
    assert_eq!(report.status, DeliveryStatus::Delivered);
}
