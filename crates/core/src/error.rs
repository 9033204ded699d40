// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for fm-core operations.

use thiserror::Error;

/// All possible errors that can occur in fm-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid '{kind}' payload: {reason}")]
    InvalidPayload { kind: String, reason: String },

    #[error("invalid mailbox patch: {0}")]
    InvalidPatch(String),
}

/// A specialized Result type for fm-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
