// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Read;
use std::path::Path;

use fm_client::{MailboxStore, MutationStatus};

use super::Session;
use crate::display::format_mailbox_line;
use crate::error::{Error, Result};

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "es"
    }
}

/// User-facing line for a mutation outcome.
pub(crate) fn describe_status(status: &MutationStatus, accepted: &str) -> String {
    match status {
        MutationStatus::Accepted => accepted.to_string(),
        MutationStatus::InProgress(message) => format!("Already in progress: {message}"),
    }
}

async fn finish(store: MailboxStore) {
    store.channel().shutdown().await;
}

pub async fn list(session: &Session, json: bool) -> Result<()> {
    let store = session.store()?;
    let result = store.fetch_all().await;
    finish(store.clone()).await;
    result?;

    let state = store.state();
    if json {
        println!("{}", serde_json::to_string_pretty(&state.emails)?);
    } else if state.emails.is_empty() {
        println!("No mailboxes");
    } else {
        for mailbox in &state.emails {
            println!(
                "{}",
                format_mailbox_line(mailbox, state.processing_status(mailbox.id))
            );
        }
    }
    Ok(())
}

pub async fn check(session: &Session, ids: &[i64], all: bool) -> Result<()> {
    let store = session.store()?;
    let mut lines = Vec::new();
    if all {
        for id in ids {
            match store.recheck_all(*id).await {
                Ok(status) => lines.push(describe_status(
                    &status,
                    &format!("Full recheck started for mailbox {id}"),
                )),
                Err(e) => {
                    finish(store).await;
                    return Err(e.into());
                }
            }
        }
    } else {
        let result = store.check_emails(ids).await;
        let accepted = format!("Check started for {} mailbox{}", ids.len(), plural(ids.len()));
        match result {
            Ok(status) => lines.push(describe_status(&status, &accepted)),
            Err(e) => {
                finish(store).await;
                return Err(e.into());
            }
        }
    }
    finish(store).await;
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

pub async fn delete(session: &Session, ids: &[i64]) -> Result<()> {
    let store = session.store()?;
    let result = store.delete_emails(ids).await;
    finish(store).await;
    let accepted = format!("Deleted {} mailbox{}", ids.len(), plural(ids.len()));
    println!("{}", describe_status(&result?, &accepted));
    Ok(())
}

/// Reads import data from a file, or from stdin for `-`.
pub(crate) fn read_import_data(file: &Path, stdin: impl Read) -> Result<String> {
    let mut data = String::new();
    if file.as_os_str() == "-" {
        let mut stdin = stdin;
        stdin.read_to_string(&mut data)?;
    } else {
        data = std::fs::read_to_string(file)?;
    }
    let data = data.trim();
    if data.is_empty() {
        let name = if file.as_os_str() == "-" {
            "stdin".to_string()
        } else {
            file.display().to_string()
        };
        return Err(Error::EmptyInput(name));
    }
    Ok(data.to_string())
}

pub async fn import(session: &Session, file: &Path, mail_type: &str) -> Result<()> {
    let data = read_import_data(file, std::io::stdin())?;
    let count = data.lines().filter(|l| !l.trim().is_empty()).count();
    let store = session.store()?;
    let result = store.import_emails(&data, mail_type).await;
    finish(store).await;
    let accepted = format!(
        "Import of {count} {mail_type} mailbox{} submitted",
        plural(count)
    );
    println!("{}", describe_status(&result?, &accepted));
    Ok(())
}

pub async fn mark_read(session: &Session, mail_id: i64) -> Result<()> {
    let store = session.store()?;
    let result = store.mark_read(mail_id).await;
    finish(store).await;
    result?;
    println!("Marked {mail_id} as read");
    Ok(())
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
