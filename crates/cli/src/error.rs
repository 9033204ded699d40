// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use fm_client::{ApiError, ConfigError, CredentialError, StoreError};
use thiserror::Error;

/// Errors reported by the `firemail` commands.
///
/// Messages are printed as `error: <message>`; hints follow on their own line.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not logged in\n  hint: run 'firemail login <username>' first")]
    NotLoggedIn,

    #[error("login failed: {0}")]
    LoginFailed(String),

    #[error("{0} is empty")]
    EmptyInput(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("credential error: {0}")]
    Credentials(#[from] CredentialError),

    #[error("{}", api_message(.0))]
    Api(#[from] ApiError),

    #[error("{}", store_message(.0))]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Appends a login hint to authorization failures.
fn api_message(error: &ApiError) -> String {
    match error {
        ApiError::Unauthorized => {
            format!("{error}\n  hint: run 'firemail login <username>'")
        }
        _ => error.to_string(),
    }
}

/// The store's message followed by its cause.
fn store_message(error: &StoreError) -> String {
    match error {
        StoreError::Api { action, source } => format!("{action}: {}", api_message(source)),
        StoreError::Channel { action, source } => format!("{action}: {source}"),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
