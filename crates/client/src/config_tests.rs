// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::collections::HashMap;
use tempfile::TempDir;
use yare::parameterized;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

fn with_server(api_url: &str, ws_url: Option<&str>) -> ClientConfig {
    ClientConfig {
        server: ServerConfig {
            api_url: api_url.to_string(),
            ws_url: ws_url.map(str::to_string),
        },
        ..ClientConfig::default()
    }
}

#[test]
fn empty_file_uses_defaults() {
    let config: ClientConfig = toml::from_str("").unwrap();
    assert_eq!(config, ClientConfig::default());
    assert_eq!(config.channel.heartbeat_interval_ms, 20_000);
    assert_eq!(config.store.fetch_attempts, 3);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config: ClientConfig = toml::from_str(
        r#"
        [server]
        api_url = "https://mail.example.com"

        [channel]
        reconnect_max_retries = 0
        "#,
    )
    .unwrap();

    assert_eq!(config.server.api_url, "https://mail.example.com");
    assert_eq!(config.channel.reconnect_max_retries, 0);
    assert_eq!(config.channel.reconnect_base_ms, 1_000);
    assert_eq!(config.store, StoreSettings::default());
}

#[test]
fn save_and_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("config.toml");
    let mut config = with_server("http://10.0.0.2:5000", Some("ws://10.0.0.2:9000"));
    config.store.retry_delay_ms = 50;
    config.token = Some("secret".to_string());

    config.save(&path).unwrap();
    let loaded = ClientConfig::load(&path).unwrap();

    assert_eq!(loaded.server, config.server);
    assert_eq!(loaded.store.retry_delay_ms, 50);
    assert_eq!(loaded.token, None);
    assert!(!std::fs::read_to_string(&path).unwrap().contains("secret"));
}

#[test]
fn missing_file_loads_defaults() {
    let temp = TempDir::new().unwrap();
    let config = ClientConfig::load_or_default(&temp.path().join("absent.toml")).unwrap();
    assert_eq!(config, ClientConfig::default());
}

#[test]
fn missing_file_is_an_error_for_load() {
    let temp = TempDir::new().unwrap();
    let err = ClientConfig::load(&temp.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "[channel]\nauth_delay_ms = \"soon\"\n").unwrap();

    let err = ClientConfig::load_or_default(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn env_overrides_urls_and_token() {
    let mut config = ClientConfig::default();
    config.apply_env(env(&[
        (ENV_API_URL, "https://mail.example.com"),
        (ENV_WS_URL, "wss://push.example.com/ws"),
        (ENV_TOKEN, " abc \n"),
    ]));

    assert_eq!(config.api_url(), "https://mail.example.com/api");
    assert_eq!(config.ws_url().unwrap(), "wss://push.example.com/ws");
    assert_eq!(config.token.as_deref(), Some("abc"));
}

#[test]
fn empty_env_values_are_ignored() {
    let mut config = ClientConfig::default();
    config.apply_env(env(&[(ENV_API_URL, ""), (ENV_TOKEN, "  ")]));
    assert_eq!(config, ClientConfig::default());
}

#[parameterized(
    http_api = { "http://mail.example.com:5000", None, "ws://mail.example.com:8765" },
    https_api = { "https://mail.example.com/api", None, "wss://mail.example.com:8765" },
    default_api = { "http://localhost:5000/api", None, "ws://localhost:8765" },
    explicit_ws = { "http://a.example.com", Some("ws://b.example.com:1234"), "ws://b.example.com:1234" },
    explicit_wss = { "http://a.example.com", Some("wss://b.example.com/socket"), "wss://b.example.com/socket" },
    path_on_api_host = { "https://mail.example.com", Some("/ws"), "wss://mail.example.com/ws" },
    path_keeps_api_port = { "http://mail.example.com:5000", Some("/ws"), "ws://mail.example.com:5000/ws" },
)]
fn ws_url_resolution(api_url: &str, ws_url: Option<&str>, expected: &str) {
    assert_eq!(with_server(api_url, ws_url).ws_url().unwrap(), expected);
}

#[test]
fn unsupported_ws_url_is_rejected() {
    let config = with_server("http://mail.example.com", Some("ftp://mail.example.com"));
    assert!(matches!(
        config.ws_url(),
        Err(ConfigError::InvalidUrl { .. })
    ));
}

#[test]
fn relative_api_url_cannot_derive_ws_url() {
    let config = with_server("/api", None);
    assert!(matches!(
        config.ws_url(),
        Err(ConfigError::InvalidUrl { .. })
    ));
}

#[test]
fn channel_config_converts_units() {
    let mut config = ClientConfig::default();
    config.channel.reconnect_max_delay_secs = 60;
    config.channel.heartbeat_interval_ms = 0;

    let channel = config.channel_config().unwrap();

    assert_eq!(channel.url, "ws://localhost:8765");
    assert_eq!(channel.connect_timeout, Duration::from_secs(10));
    assert_eq!(channel.auth_delay, Duration::from_millis(200));
    assert_eq!(channel.reconnect_cap, Duration::from_secs(60));
    assert!(channel.heartbeat_interval.is_zero());
    assert_eq!(channel.max_reconnect_attempts, 5);
}

#[test]
fn store_config_needs_at_least_one_attempt() {
    let mut config = ClientConfig::default();
    config.store.fetch_attempts = 0;

    let store = config.store_config();

    assert_eq!(store.fetch_attempts, 1);
    assert_eq!(store.records_timeout, Duration::from_secs(15));
    assert_eq!(store.progress_settle, Duration::from_secs(1));
}

#[test]
fn api_config_uses_normalized_url() {
    let config = with_server("http://mail.example.com/", None);
    assert_eq!(config.api_config().base_url, "http://mail.example.com/api");
}
