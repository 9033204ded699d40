// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Store state and its pure transitions.
//!
//! Every transition that changes the mailbox collection also prunes the
//! selection, so the selection is always a subset of the current ids.

use std::collections::BTreeMap;

use fm_core::{CheckProgress, EmailAccount, MailRecord, RecordId};

/// Snapshot of everything the store holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub emails: Vec<EmailAccount>,
    /// An operation is in flight.
    pub loading: bool,
    /// Last user-visible failure.
    pub error: Option<String>,
    /// Selected mailbox ids, in selection order.
    pub selected: Vec<i64>,
    /// Latest check progress per mailbox.
    pub processing: BTreeMap<i64, CheckProgress>,
    /// Records of the current mailbox.
    pub current_records: Vec<MailRecord>,
    pub current_email_id: Option<i64>,
    /// The channel is connected and authenticated.
    pub connected: bool,
}

impl StoreState {
    pub fn email_by_id(&self, id: i64) -> Option<&EmailAccount> {
        self.emails.iter().find(|e| e.id == id)
    }

    pub fn processing_status(&self, id: i64) -> Option<&CheckProgress> {
        self.processing.get(&id)
    }

    pub fn has_selection(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_all_selected(&self) -> bool {
        !self.emails.is_empty() && self.selected.len() == self.emails.len()
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selected.contains(&id)
    }

    /// Replaces the whole collection.
    pub(crate) fn replace_emails(&mut self, emails: Vec<EmailAccount>) {
        self.emails = emails;
        self.prune_selection();
    }

    /// Removes mailboxes by id from the collection and the selection.
    pub(crate) fn remove_emails(&mut self, ids: &[i64]) {
        self.emails.retain(|e| !ids.contains(&e.id));
        self.selected.retain(|id| !ids.contains(id));
    }

    fn prune_selection(&mut self) {
        let emails = &self.emails;
        self.selected.retain(|id| emails.iter().any(|e| e.id == *id));
    }

    /// Adds or removes `id` from the selection. Unknown ids are ignored.
    pub(crate) fn toggle_select(&mut self, id: i64) -> bool {
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
            return true;
        }
        if self.email_by_id(id).is_none() {
            return false;
        }
        self.selected.push(id);
        true
    }

    pub(crate) fn select_all(&mut self) {
        self.selected = self.emails.iter().map(|e| e.id).collect();
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub(crate) fn set_progress(&mut self, progress: CheckProgress) {
        self.processing.insert(progress.email_id, progress);
    }

    /// Replaces the records if `email_id` is the current mailbox.
    ///
    /// Returns false when the records are stale and were discarded.
    pub(crate) fn apply_records(&mut self, email_id: i64, records: Vec<MailRecord>) -> bool {
        if self.current_email_id != Some(email_id) {
            return false;
        }
        self.current_records = records;
        true
    }

    /// Marks a record read and decrements the current mailbox's unread count.
    pub(crate) fn mark_record_read(&mut self, mail_id: i64) {
        let target = RecordId::Server(mail_id);
        if let Some(record) = self.current_records.iter_mut().find(|r| r.id == target) {
            record.is_read = true;
        }
        if let Some(current) = self.current_email_id {
            if let Some(email) = self.emails.iter_mut().find(|e| e.id == current) {
                email.mark_one_read();
            }
        }
    }
}
