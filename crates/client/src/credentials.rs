// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer token storage.
//!
//! The channel reads the token before every connection attempt and every
//! authentication message; the fallback API reads it on every call and
//! clears it when the server answers 401.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::warn;

const DATA_DIR_NAME: &str = "firemail";
const TOKEN_FILE_NAME: &str = "token";

const LOG_TARGET: &str = "firemail::credentials";

/// Error type for credential storage.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no data directory available on this platform")]
    NoDataDir,
}

/// Storage for the session token.
pub trait CredentialStore: Send + Sync {
    /// Returns the current token, if any.
    fn token(&self) -> Option<String>;

    /// Replaces the token; `None` clears it.
    fn set_token(&self, token: Option<String>) -> Result<(), CredentialError>;
}

/// In-memory token storage.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    token: RwLock<Option<String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        MemoryCredentials {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentials {
    fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_token(&self, token: Option<String>) -> Result<(), CredentialError> {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
        Ok(())
    }
}

/// Token stored in a file, one line, no trailing data.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCredentials { path: path.into() }
    }

    /// Token file under the platform data directory.
    pub fn default_path() -> Result<PathBuf, CredentialError> {
        dirs::data_dir()
            .map(|d| d.join(DATA_DIR_NAME).join(TOKEN_FILE_NAME))
            .ok_or(CredentialError::NoDataDir)
    }

    pub fn open_default() -> Result<Self, CredentialError> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, token: &str) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write then rename so a reader never sees a half-written token
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, token)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentials {
    fn token(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(
                    target: LOG_TARGET,
                    path = %self.path.display(),
                    error = %e,
                    "failed to read token file"
                );
                None
            }
        }
    }

    fn set_token(&self, token: Option<String>) -> Result<(), CredentialError> {
        match token {
            Some(token) => self.write(&token),
            None => match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            },
        }
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
