// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fm-client: Real-time channel, REST fallback and mailbox store for FireMail.
//!
//! # Main Components
//!
//! - [`ChannelClient`] - WebSocket channel with authentication, heartbeat and reconnect
//! - [`HttpFallbackApi`] - REST client used when the channel cannot answer
//! - [`MailboxStore`] - Mailbox collection kept in sync over both paths
//! - [`ClientConfig`] - TOML configuration with environment overrides
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fm_client::{ChannelClient, ClientConfig, FileCredentials, HttpFallbackApi, MailboxStore};
//!
//! let config = ClientConfig::load_or_default(&ClientConfig::default_path()?)?;
//! let credentials = Arc::new(FileCredentials::open_default()?);
//! let channel = ChannelClient::websocket(config.channel_config()?, credentials.clone());
//! let api = Arc::new(HttpFallbackApi::new(config.api_config(), credentials));
//! let store = MailboxStore::new(channel, api, config.store_config());
//!
//! store.install_listeners();
//! store.fetch_all().await?;
//! ```

pub mod api;
pub mod channel;
pub mod config;
pub mod credentials;
pub mod store;

#[cfg(test)]
mod test_support;

pub use api::{ApiError, ApiRequest, FallbackApi, HttpApiConfig, HttpFallbackApi};
pub use channel::{
    ChannelClient, ChannelConfig, ChannelError, ChannelFailure, ChannelStatus, ConnectionState,
    CorrelatedRequest, RequestError,
};
pub use config::{ClientConfig, ConfigError};
pub use credentials::{CredentialError, CredentialStore, FileCredentials, MemoryCredentials};
pub use store::{MailboxStore, MutationStatus, StoreConfig, StoreError, StoreState};
