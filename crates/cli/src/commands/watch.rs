// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Live view of the store: prints one line per observable change.

use fm_client::StoreState;

use super::Session;
use crate::display::{format_mailbox_line, format_progress};
use crate::error::Result;

/// Lines describing what changed between two store snapshots.
pub(crate) fn describe_changes(previous: &StoreState, current: &StoreState) -> Vec<String> {
    let mut lines = Vec::new();

    if previous.connected != current.connected {
        lines.push(if current.connected {
            "Connected".to_string()
        } else {
            "Disconnected".to_string()
        });
    }

    if current.error != previous.error {
        if let Some(error) = &current.error {
            lines.push(format!("Error: {error}"));
        }
    }

    for mailbox in &current.emails {
        if previous.email_by_id(mailbox.id).is_none() {
            lines.push(format!("Added {}", format_mailbox_line(mailbox, None)));
        }
    }
    for mailbox in &previous.emails {
        if current.email_by_id(mailbox.id).is_none() {
            lines.push(format!("Removed [{}] {}", mailbox.id, mailbox.email));
        }
    }

    for (id, progress) in &current.processing {
        if previous.processing.get(id) != Some(progress) {
            lines.push(format!("Mailbox {id} {}", format_progress(progress)));
        }
    }

    if current.current_records != previous.current_records {
        if let Some(id) = current.current_email_id {
            let unread = current.current_records.iter().filter(|r| !r.is_read).count();
            lines.push(format!(
                "Mailbox {id}: {} records, {unread} unread",
                current.current_records.len()
            ));
        }
    }

    lines
}

pub async fn run(session: &Session) -> Result<()> {
    let store = session.store()?;
    let url = session.config.ws_url()?;
    let mut states = store.subscribe();
    let mut previous = store.state();

    store.install_listeners();
    store.channel().connect();
    eprintln!("Watching {url} (Ctrl-C to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = states.borrow_and_update().clone();
                for line in describe_changes(&previous, &current) {
                    println!("{line}");
                }
                previous = current;
            }
        }
    }

    store.reset();
    store.channel().shutdown().await;
    Ok(())
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
