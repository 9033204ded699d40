// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use fm_core::MailRecord;

use super::Session;
use crate::display::format_record;
use crate::error::Result;

/// Records to show, optionally only the unread ones.
pub(crate) fn select_records(records: &[MailRecord], unread_only: bool) -> Vec<&MailRecord> {
    records
        .iter()
        .filter(|r| !unread_only || !r.is_read)
        .collect()
}

pub async fn run(session: &Session, email_id: i64, json: bool, unread_only: bool) -> Result<()> {
    let store = session.store()?;
    let result = store.fetch_records_for(email_id).await;
    store.channel().shutdown().await;
    result?;

    let state = store.state();
    let records = select_records(&state.current_records, unread_only);
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No records for mailbox {email_id}");
        return Ok(());
    }
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            println!();
        }
        for line in format_record(record) {
            println!("{line}");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
