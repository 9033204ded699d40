// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox and mail record models.
//!
//! Mailboxes (`EmailAccount`) are the items the store keeps in its main
//! collection. Mail records arrive from the server with any subset of their
//! fields populated and are normalized into `MailRecord` before they reach a
//! collection, so consumers never see a partially populated record.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{Error, Result};
use crate::lenient;

pub const DEFAULT_SUBJECT: &str = "(no subject)";
pub const DEFAULT_SENDER: &str = "(unknown sender)";
pub const DEFAULT_CONTENT: &str = "(no content)";
pub const DEFAULT_FOLDER: &str = "INBOX";

/// A mailbox account as listed by the server.
///
/// Fields the client does not interpret are kept in `extra` so that a
/// round-trip through the store never drops server data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailAccount {
    #[serde(deserialize_with = "lenient::id")]
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmailAccount {
    /// Creates a mailbox with only an id and address.
    pub fn new(id: i64, email: impl Into<String>) -> Self {
        EmailAccount {
            id,
            email: email.into(),
            mail_type: None,
            unread_count: None,
            last_check_time: None,
            extra: Map::new(),
        }
    }

    /// Returns true if this is an IMAP-family account.
    pub fn is_imap(&self) -> bool {
        self.mail_type.as_deref() == Some("imap")
    }

    /// Applies a shallow patch, field by field, the way a JSON object spread does.
    ///
    /// The id may not change.
    pub fn apply_patch(&mut self, patch: &Map<String, Value>) -> Result<()> {
        let mut merged = match serde_json::to_value(&*self)? {
            Value::Object(map) => map,
            _ => return Err(Error::InvalidPatch("mailbox is not an object".into())),
        };
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }
        let updated: EmailAccount = serde_json::from_value(Value::Object(merged))?;
        if updated.id != self.id {
            return Err(Error::InvalidPatch(format!(
                "patch changes id {} to {}",
                self.id, updated.id
            )));
        }
        *self = updated;
        Ok(())
    }

    /// Decrements the unread counter, never below zero.
    pub fn mark_one_read(&mut self) {
        if let Some(count) = self.unread_count.as_mut() {
            if *count > 0 {
                *count -= 1;
            }
        }
    }
}

/// Identity of a mail record.
///
/// Records from the server carry an integer id; records missing one get a
/// locally generated id so that they stay addressable in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Server(i64),
    Local(String),
}

impl RecordId {
    /// Generates a fresh local id.
    pub fn local() -> Self {
        RecordId::Local(format!("local-{}", uuid::Uuid::new_v4()))
    }

    /// Returns the server id, if this record came with one.
    pub fn server_id(&self) -> Option<i64> {
        match self {
            RecordId::Server(id) => Some(*id),
            RecordId::Local(_) => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Server(id) => write!(f, "{}", id),
            RecordId::Local(id) => write!(f, "{}", id),
        }
    }
}

/// A mail record as received, with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMailRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub received_time: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default, deserialize_with = "lenient::read_flag")]
    pub is_read: Option<bool>,
    #[serde(default)]
    pub graph_message_id: Option<String>,
}

/// A fully populated mail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailRecord {
    pub id: RecordId,
    pub subject: String,
    pub sender: String,
    pub received_time: String,
    pub content: String,
    pub folder: String,
    pub is_read: bool,
    pub graph_message_id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl RawMailRecord {
    /// Fills every missing field with its default.
    ///
    /// Empty strings count as missing. `now` is used for a missing receive time.
    pub fn normalize(self, now: DateTime<Utc>) -> MailRecord {
        MailRecord {
            id: self.id.unwrap_or_else(RecordId::local),
            subject: non_empty(self.subject).unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            sender: non_empty(self.sender).unwrap_or_else(|| DEFAULT_SENDER.to_string()),
            received_time: non_empty(self.received_time)
                .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            content: non_empty(self.content).unwrap_or_else(|| DEFAULT_CONTENT.to_string()),
            folder: non_empty(self.folder).unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
            is_read: self.is_read.unwrap_or(true),
            graph_message_id: non_empty(self.graph_message_id),
        }
    }
}

/// Normalizes a batch of raw records against the current time.
pub fn normalize_records(records: Vec<RawMailRecord>) -> Vec<MailRecord> {
    let now = Utc::now();
    records.into_iter().map(|r| r.normalize(now)).collect()
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
