// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::Value;

/// Failure of a fallback API call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// 409: the server is already working on this resource.
    #[error("{0}")]
    Conflict(String),

    /// 401: the stored token was rejected and has been cleared.
    #[error("not authorized; log in again")]
    Unauthorized,

    #[error("server returned {code}: {message}")]
    Status { code: u16, message: String },

    /// No response was received.
    #[error("unable to reach the server: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Maps a non-success status and its body to an error.
    pub fn from_status(code: u16, body: &Value) -> Self {
        match code {
            401 => ApiError::Unauthorized,
            409 => ApiError::Conflict(
                server_message(body).unwrap_or_else(|| "operation already in progress".to_string()),
            ),
            _ => ApiError::Status {
                code,
                message: server_message(body).unwrap_or_else(|| "request failed".to_string()),
            },
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict(_))
    }
}

/// Human-readable text from an error body: `message`, then `error`, then a
/// plain-text body.
pub(crate) fn server_message(body: &Value) -> Option<String> {
    let text = match body {
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str),
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
