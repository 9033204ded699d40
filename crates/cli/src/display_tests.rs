// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use fm_core::{RawMailRecord, RecordId};
use yare::parameterized;

fn progress(value: Option<f64>, message: Option<&str>) -> CheckProgress {
    CheckProgress {
        email_id: 1,
        progress: value,
        message: message.map(str::to_string),
    }
}

fn record(content: &str, is_read: bool) -> MailRecord {
    RawMailRecord {
        id: Some(RecordId::Server(901)),
        subject: Some("Quarterly report".into()),
        sender: Some("alice@example.com".into()),
        received_time: Some("2026-01-05T09:30:00Z".into()),
        content: Some(content.into()),
        is_read: Some(is_read),
        ..RawMailRecord::default()
    }
    .normalize(chrono::Utc::now())
}

#[parameterized(
    short = { "hello world", 20, "hello world" },
    exact = { "abcde", 5, "abcde" },
    cut = { "the quick brown fox", 12, "the quick..." },
    whitespace = { "line one\n\n  line two", 40, "line one line two" },
    multibyte = { "邮件内容很长很长很长", 6, "邮件内..." },
)]
fn preview_cases(content: &str, width: usize, expected: &str) {
    assert_eq!(preview(content, width), expected);
}

#[parameterized(
    partial = { Some(40.0), Some("fetching"), "[ 40%] fetching" },
    unknown = { None, None, "[ ..%]" },
    complete = { Some(100.0), Some("finished"), "[done] finished" },
    over = { Some(120.0), None, "[done]" },
    empty_message = { Some(5.0), Some(""), "[  5%]" },
)]
fn progress_cases(value: Option<f64>, message: Option<&str>, expected: &str) {
    assert_eq!(format_progress(&progress(value, message)), expected);
}

#[test]
fn mailbox_line_with_details() {
    let mut mailbox = EmailAccount::new(3, "bob@example.com");
    mailbox.mail_type = Some("imap".into());
    mailbox.unread_count = Some(4);
    mailbox.last_check_time = Some("2026-01-05 10:00".into());

    assert_eq!(
        format_mailbox_line(&mailbox, None),
        "- [3] bob@example.com (imap, 4 unread), checked 2026-01-05 10:00"
    );
}

#[test]
fn mailbox_line_minimal() {
    let mut mailbox = EmailAccount::new(3, "bob@example.com");
    mailbox.unread_count = Some(0);
    assert_eq!(format_mailbox_line(&mailbox, None), "- [3] bob@example.com");
}

#[test]
fn mailbox_line_with_progress() {
    let mailbox = EmailAccount::new(3, "bob@example.com");
    let line = format_mailbox_line(&mailbox, Some(&progress(Some(60.0), None)));
    assert_eq!(line, "- [3] bob@example.com [ 60%]");
}

#[test]
fn unread_record_is_marked() {
    let lines = format_record(&record("The numbers are in", false));
    assert_eq!(
        lines,
        vec![
            "* [901] 2026-01-05T09:30:00Z  alice@example.com",
            "  Quarterly report (INBOX)",
            "    The numbers are in",
        ]
    );
}

#[test]
fn read_record_is_not_marked() {
    let lines = format_record(&record("ok", true));
    assert!(lines[0].starts_with("  [901]"));
}
