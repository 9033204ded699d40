// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Configuration is stored in `config.toml` under the platform config
//! directory and has three sections:
//! - `server`: API and WebSocket URLs
//! - `channel`: connection timings and reconnect policy
//! - `store`: retry policy and request timeouts for synchronization
//!
//! Every field has a default, so an empty or missing file is valid.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::api::{normalize_base_url, HttpApiConfig, DEFAULT_API_URL};
use crate::channel::ChannelConfig;
use crate::store::StoreConfig;

const CONFIG_DIR_NAME: &str = "firemail";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Port the real-time server listens on when only the API URL is known.
pub const DEFAULT_WS_PORT: u16 = 8765;

pub const ENV_WS_URL: &str = "FIREMAIL_WS_URL";
pub const ENV_API_URL: &str = "FIREMAIL_API_URL";
pub const ENV_TOKEN: &str = "FIREMAIL_TOKEN";

/// Error type for configuration handling.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("no config directory available on this platform")]
    NoConfigDir,

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub channel: ChannelSettings,
    #[serde(default)]
    pub store: StoreSettings,
    /// Token from the environment; never written to disk.
    #[serde(skip)]
    pub token: Option<String>,
}

/// Server endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// REST API root; `/api` is appended when missing.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// WebSocket URL. Derived from `api_url` when absent; a path starting
    /// with `/` is resolved against the API host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            api_url: default_api_url(),
            ws_url: None,
        }
    }
}

/// Connection timings and reconnect policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Time allowed for the socket to open, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Delay between open and authentication, in milliseconds.
    #[serde(default = "default_auth_delay_ms")]
    pub auth_delay_ms: u64,
    /// Heartbeat interval in milliseconds. 0 = disabled.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Time to wait for a heartbeat response in milliseconds.
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
    /// First reconnect delay in milliseconds.
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,
    /// Largest reconnect delay in seconds.
    #[serde(default = "default_reconnect_max_delay_secs")]
    pub reconnect_max_delay_secs: u64,
    /// Reconnect attempts before giving up. 0 = unlimited.
    #[serde(default = "default_reconnect_max_retries")]
    pub reconnect_max_retries: u32,
    /// Delay before the fresh connect of a forced reconnect, in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_auth_delay_ms() -> u64 {
    200
}

fn default_heartbeat_interval_ms() -> u64 {
    20_000
}

fn default_heartbeat_timeout_ms() -> u64 {
    10_000
}

fn default_reconnect_base_ms() -> u64 {
    1_000
}

fn default_reconnect_max_delay_secs() -> u64 {
    30
}

fn default_reconnect_max_retries() -> u32 {
    5
}

fn default_reconnect_delay_ms() -> u64 {
    500
}

impl Default for ChannelSettings {
    fn default() -> Self {
        ChannelSettings {
            connect_timeout_secs: default_connect_timeout_secs(),
            auth_delay_ms: default_auth_delay_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            heartbeat_timeout_ms: default_heartbeat_timeout_ms(),
            reconnect_base_ms: default_reconnect_base_ms(),
            reconnect_max_delay_secs: default_reconnect_max_delay_secs(),
            reconnect_max_retries: default_reconnect_max_retries(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

/// Synchronization retry policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Channel attempts per fetch before the fallback API is used.
    #[serde(default = "default_fetch_attempts")]
    pub fetch_attempts: u32,
    /// Pause after a failed channel attempt, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Timeout for one mailbox list request, in milliseconds.
    #[serde(default = "default_list_timeout_ms")]
    pub list_timeout_ms: u64,
    /// Timeout for one mail records request, in milliseconds.
    #[serde(default = "default_records_timeout_ms")]
    pub records_timeout_ms: u64,
    /// Wait after a finished check before refetching, in milliseconds.
    #[serde(default = "default_progress_settle_ms")]
    pub progress_settle_ms: u64,
}

fn default_fetch_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    300
}

fn default_list_timeout_ms() -> u64 {
    10_000
}

fn default_records_timeout_ms() -> u64 {
    15_000
}

fn default_progress_settle_ms() -> u64 {
    1_000
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            fetch_attempts: default_fetch_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            list_timeout_ms: default_list_timeout_ms(),
            records_timeout_ms: default_records_timeout_ms(),
            progress_settle_ms: default_progress_settle_ms(),
        }
    }
}

impl ClientConfig {
    /// Path of the config file under the platform config directory.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Loads the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads the config file at `path`, or the defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ClientConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the config to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Applies `FIREMAIL_*` overrides read through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_API_URL) {
            self.server.api_url = url;
        }
        if let Some(url) = get(ENV_WS_URL) {
            self.server.ws_url = Some(url);
        }
        if let Some(token) = get(ENV_TOKEN) {
            self.token = Some(token.trim().to_string());
        }
    }

    /// Applies overrides from the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }

    /// Normalized API root.
    pub fn api_url(&self) -> String {
        normalize_base_url(&self.server.api_url)
    }

    /// Resolves the WebSocket URL.
    ///
    /// An explicit `ws://` or `wss://` URL is used as-is. A path is joined to
    /// the API host. Otherwise the API URL's scheme maps `http` to `ws` and
    /// `https` to `wss`, on port 8765.
    pub fn ws_url(&self) -> Result<String, ConfigError> {
        match self.server.ws_url.as_deref().map(str::trim) {
            Some(url) if url.starts_with("ws://") || url.starts_with("wss://") => {
                Ok(url.to_string())
            }
            Some(path) if path.starts_with('/') => {
                let api = self.parse_api_url()?;
                let mut url = ws_origin(&api, api.port())?;
                url.set_path(path);
                Ok(url.to_string())
            }
            Some(other) => Err(ConfigError::InvalidUrl {
                url: other.to_string(),
                reason: "expected ws://, wss:// or a path".to_string(),
            }),
            None => {
                let api = self.parse_api_url()?;
                let url = ws_origin(&api, Some(DEFAULT_WS_PORT))?;
                Ok(url.as_str().trim_end_matches('/').to_string())
            }
        }
    }

    fn parse_api_url(&self) -> Result<Url, ConfigError> {
        let api_url = self.api_url();
        Url::parse(&api_url).map_err(|e| ConfigError::InvalidUrl {
            url: api_url,
            reason: e.to_string(),
        })
    }

    pub fn channel_config(&self) -> Result<ChannelConfig, ConfigError> {
        let c = &self.channel;
        Ok(ChannelConfig {
            url: self.ws_url()?,
            connect_timeout: Duration::from_secs(c.connect_timeout_secs),
            auth_delay: Duration::from_millis(c.auth_delay_ms),
            heartbeat_interval: Duration::from_millis(c.heartbeat_interval_ms),
            heartbeat_timeout: Duration::from_millis(c.heartbeat_timeout_ms),
            reconnect_base: Duration::from_millis(c.reconnect_base_ms),
            reconnect_cap: Duration::from_secs(c.reconnect_max_delay_secs),
            max_reconnect_attempts: c.reconnect_max_retries,
            reconnect_delay: Duration::from_millis(c.reconnect_delay_ms),
        })
    }

    pub fn store_config(&self) -> StoreConfig {
        let s = &self.store;
        StoreConfig {
            fetch_attempts: s.fetch_attempts.max(1),
            retry_delay: Duration::from_millis(s.retry_delay_ms),
            list_timeout: Duration::from_millis(s.list_timeout_ms),
            records_timeout: Duration::from_millis(s.records_timeout_ms),
            progress_settle: Duration::from_millis(s.progress_settle_ms),
        }
    }

    pub fn api_config(&self) -> HttpApiConfig {
        HttpApiConfig {
            base_url: self.api_url(),
            ..HttpApiConfig::default()
        }
    }
}

/// `ws(s)://host[:port]/` for the API URL's host.
fn ws_origin(api: &Url, port: Option<u16>) -> Result<Url, ConfigError> {
    let scheme = match api.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    let host = api.host_str().ok_or_else(|| ConfigError::InvalidUrl {
        url: api.to_string(),
        reason: "missing host".to_string(),
    })?;
    let origin = match port {
        Some(port) => format!("{scheme}://{host}:{port}/"),
        None => format!("{scheme}://{host}/"),
    };
    Url::parse(&origin).map_err(|e| ConfigError::InvalidUrl {
        url: origin,
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
