// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use fm_core::{CheckProgress, EmailAccount, MailRecord};

/// Maximum width of a record's content preview.
const PREVIEW_WIDTH: usize = 96;

/// Collapse whitespace and cut `content` to at most `width` characters.
///
/// A cut preview ends with `...`.
pub fn preview(content: &str, width: usize) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }
    let keep = width.saturating_sub(3);
    let mut cut: String = collapsed.chars().take(keep).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str("...");
    cut
}

/// Progress as `[ 40%] message`, or `[done]` once complete.
pub fn format_progress(progress: &CheckProgress) -> String {
    let label = if progress.is_complete() {
        "[done]".to_string()
    } else {
        match progress.progress {
            Some(p) => format!("[{:>3.0}%]", p.clamp(0.0, 100.0)),
            None => "[ ..%]".to_string(),
        }
    };
    match progress.message.as_deref().filter(|m| !m.is_empty()) {
        Some(message) => format!("{label} {message}"),
        None => label,
    }
}

/// One line per mailbox: `- [id] address (type, N unread)`.
///
/// A check in progress is appended after the details.
pub fn format_mailbox_line(mailbox: &EmailAccount, progress: Option<&CheckProgress>) -> String {
    let mut details = Vec::new();
    if let Some(kind) = mailbox.mail_type.as_deref() {
        details.push(kind.to_string());
    }
    if let Some(unread) = mailbox.unread_count.filter(|n| *n > 0) {
        details.push(format!("{unread} unread"));
    }
    let mut line = format!("- [{}] {}", mailbox.id, mailbox.email);
    if !details.is_empty() {
        line.push_str(&format!(" ({})", details.join(", ")));
    }
    if let Some(checked) = mailbox.last_check_time.as_deref() {
        line.push_str(&format!(", checked {checked}"));
    }
    if let Some(progress) = progress {
        line.push(' ');
        line.push_str(&format_progress(progress));
    }
    line
}

/// A record as a header line plus an indented content preview.
///
/// ```text
/// * [901] 2026-01-05T09:30:00Z  alice@example.com
///   Quarterly report (INBOX)
///     The numbers are in...
/// ```
pub fn format_record(record: &MailRecord) -> Vec<String> {
    let marker = if record.is_read { ' ' } else { '*' };
    vec![
        format!(
            "{marker} [{}] {}  {}",
            record.id, record.received_time, record.sender
        ),
        format!("  {} ({})", record.subject, record.folder),
        format!("    {}", preview(&record.content, PREVIEW_WIDTH)),
    ]
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
