// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod auth;
pub mod mailbox;
pub mod records;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use fm_client::{
    ChannelClient, ClientConfig, CredentialStore, FileCredentials, HttpFallbackApi, MailboxStore,
    MemoryCredentials,
};
use tracing::debug;

use crate::error::{Error, Result};

/// Configuration and credentials shared by every command.
pub struct Session {
    pub config: ClientConfig,
    pub credentials: Arc<dyn CredentialStore>,
}

impl Session {
    /// Loads the config (default location unless `config_path` is given),
    /// applies environment overrides and opens the credential store.
    ///
    /// A token from the environment is kept in memory and never written.
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => ClientConfig::default_path()?,
        };
        let mut config = ClientConfig::load_or_default(&path)?;
        config.apply_process_env();
        debug!(path = %path.display(), api_url = %config.api_url(), "config loaded");

        let credentials: Arc<dyn CredentialStore> = match config.token.clone() {
            Some(token) => Arc::new(MemoryCredentials::with_token(token)),
            None => Arc::new(FileCredentials::open_default()?),
        };
        Ok(Session::with_credentials(config, credentials))
    }

    pub fn with_credentials(config: ClientConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Session {
            config,
            credentials,
        }
    }

    pub fn api(&self) -> HttpFallbackApi {
        HttpFallbackApi::new(self.config.api_config(), Arc::clone(&self.credentials))
    }

    /// Fails early when there is no token to authenticate with.
    pub fn require_token(&self) -> Result<()> {
        match self.credentials.token() {
            Some(_) => Ok(()),
            None => Err(Error::NotLoggedIn),
        }
    }

    /// Builds a store over a WebSocket channel and the REST API.
    ///
    /// Must be called from within the runtime; the channel task is spawned
    /// immediately but connects lazily.
    pub fn store(&self) -> Result<MailboxStore> {
        self.require_token()?;
        let channel =
            ChannelClient::websocket(self.config.channel_config()?, Arc::clone(&self.credentials));
        Ok(MailboxStore::new(
            channel,
            Arc::new(self.api()),
            self.config.store_config(),
        ))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
