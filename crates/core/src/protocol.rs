// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! Every frame is a flat JSON object with a `type` field and the payload
//! fields beside it; there is no nested envelope and no versioning:
//!
//! ```text
//! {"type": "get_mail_records", "email_id": 42}
//! ```
//!
//! The client sends requests and receives both direct replies and
//! unsolicited pushes. A reply is not tied to its request by an id; callers
//! match it by type and payload (see `fm-client`'s correlated requests).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::lenient;
use crate::models::{EmailAccount, RawMailRecord};

/// Message type names.
pub mod message_type {
    // Reserved: handled by the channel before generic dispatch.
    pub const AUTHENTICATE: &str = "authenticate";
    pub const AUTH_RESULT: &str = "auth_result";
    pub const CONNECTION_ESTABLISHED: &str = "connection_established";
    pub const HEARTBEAT: &str = "heartbeat";
    pub const HEARTBEAT_RESPONSE: &str = "heartbeat_response";
    pub const ERROR: &str = "error";

    // Requests.
    pub const GET_ALL_EMAILS: &str = "get_all_emails";
    pub const CHECK_EMAILS: &str = "check_emails";
    pub const DELETE_EMAILS: &str = "delete_emails";
    pub const ADD_EMAIL: &str = "add_email";
    pub const GET_MAIL_RECORDS: &str = "get_mail_records";
    pub const IMPORT_EMAILS: &str = "import_emails";

    // Replies and pushes.
    pub const EMAILS_LIST: &str = "emails_list";
    pub const CHECK_PROGRESS: &str = "check_progress";
    pub const EMAILS_IMPORTED: &str = "emails_imported";
    pub const EMAILS_DELETED: &str = "emails_deleted";
    pub const EMAIL_ADDED: &str = "email_added";
    pub const MAIL_RECORDS: &str = "mail_records";

    // Informational notices.
    pub const INFO: &str = "info";
    pub const SUCCESS: &str = "success";
    pub const WARNING: &str = "warning";

    /// Used for inbound frames that carry no `type`.
    pub const UNKNOWN: &str = "unknown";
}

/// Text of the server's "authenticate first" error.
///
/// Matching on human-readable text is fragile: the server may localize or
/// reword it. `NOT_AUTHENTICATED_CODE` is accepted as well for servers that
/// send a structured `code`.
pub const NOT_AUTHENTICATED_TEXT: &str = "请先进行认证";

/// Structured error code equivalent to `NOT_AUTHENTICATED_TEXT`.
pub const NOT_AUTHENTICATED_CODE: &str = "not_authenticated";

fn unknown_type() -> String {
    message_type::UNKNOWN.to_string()
}

/// A protocol frame: a type plus flat payload fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type", default = "unknown_type")]
    pub kind: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Envelope {
    /// Creates a frame with no payload fields.
    pub fn new(kind: impl Into<String>) -> Self {
        Envelope {
            kind: kind.into(),
            fields: Map::new(),
        }
    }

    /// Creates a frame from a payload value.
    ///
    /// Object payloads are spread into the frame (a `type` key inside the
    /// payload is dropped); null means no fields; any other value is carried
    /// under `data`.
    pub fn with_payload(kind: impl Into<String>, payload: Value) -> Self {
        let fields = match payload {
            Value::Object(mut map) => {
                map.remove("type");
                map
            }
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        Envelope {
            kind: kind.into(),
            fields,
        }
    }

    /// Adds one field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns true if this frame has the given type.
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Returns a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns a payload field as a string slice.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Returns a payload field as an id, accepting numbers and numeric strings.
    pub fn id_field(&self, key: &str) -> Option<i64> {
        let value = self.fields.get(key)?;
        lenient::id(value.clone()).ok()
    }

    /// Decodes the payload fields into a typed message.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            Error::InvalidPayload {
                kind: self.kind.clone(),
                reason: e.to_string(),
            }
        })
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a frame from JSON.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Creates an authenticate frame.
    pub fn authenticate(token: impl Into<String>) -> Self {
        Envelope::new(message_type::AUTHENTICATE).field("token", token.into())
    }

    /// Creates a heartbeat probe.
    pub fn heartbeat() -> Self {
        Envelope::new(message_type::HEARTBEAT)
    }

    /// Creates a full mailbox list request.
    pub fn get_all_emails() -> Self {
        Envelope::new(message_type::GET_ALL_EMAILS)
    }

    /// Creates a records request for one mailbox.
    pub fn get_mail_records(email_id: i64) -> Self {
        Envelope::new(message_type::GET_MAIL_RECORDS).field("email_id", email_id)
    }

    /// Creates a check request for the given mailboxes.
    pub fn check_emails(email_ids: &[i64]) -> Self {
        Envelope::new(message_type::CHECK_EMAILS).field("email_ids", email_ids.to_vec())
    }

    /// Creates a delete request for the given mailboxes.
    pub fn delete_emails(email_ids: &[i64]) -> Self {
        Envelope::new(message_type::DELETE_EMAILS).field("email_ids", email_ids.to_vec())
    }

    /// Creates an add-mailbox request from the mailbox fields.
    pub fn add_email(account: Value) -> Self {
        Envelope::with_payload(message_type::ADD_EMAIL, account)
    }

    /// Creates an import request.
    pub fn import_emails(data: impl Into<String>, mail_type: impl Into<String>) -> Self {
        Envelope::new(message_type::IMPORT_EMAILS)
            .field("data", data.into())
            .field("mail_type", mail_type.into())
    }
}

/// Payload of `auth_result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Payload of `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorNotice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorNotice {
    /// Extracts the error notice from a frame, tolerating odd payloads.
    pub fn from_envelope(envelope: &Envelope) -> Self {
        ErrorNotice {
            message: envelope.str_field("message").map(str::to_string),
            code: envelope.str_field("code").map(str::to_string),
        }
    }

    /// Returns true if the server is asking the client to authenticate first.
    pub fn is_not_authenticated(&self) -> bool {
        self.code.as_deref() == Some(NOT_AUTHENTICATED_CODE)
            || self.message.as_deref() == Some(NOT_AUTHENTICATED_TEXT)
    }
}

/// Payload of `emails_list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailsList {
    pub data: Vec<EmailAccount>,
}

/// Payload of `emails_deleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailsDeleted {
    #[serde(deserialize_with = "lenient::ids")]
    pub email_ids: Vec<i64>,
}

/// Payload of `check_progress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckProgress {
    #[serde(deserialize_with = "lenient::id")]
    pub email_id: i64,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckProgress {
    /// Returns true once the check has reached 100%.
    pub fn is_complete(&self) -> bool {
        self.progress.is_some_and(|p| p >= 100.0)
    }
}

/// Payload of `mail_records`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailRecordsPush {
    #[serde(deserialize_with = "lenient::id")]
    pub email_id: i64,
    #[serde(default, deserialize_with = "lenient::vec_or_empty")]
    pub data: Vec<RawMailRecord>,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
