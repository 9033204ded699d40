// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::TempDir;

fn session(token: Option<&str>) -> Session {
    let credentials: Arc<dyn CredentialStore> = match token {
        Some(token) => Arc::new(MemoryCredentials::with_token(token)),
        None => Arc::new(MemoryCredentials::new()),
    };
    Session::with_credentials(ClientConfig::default(), credentials)
}

#[test]
fn missing_token_is_not_logged_in() {
    assert!(matches!(
        session(None).require_token(),
        Err(Error::NotLoggedIn)
    ));
}

#[tokio::test]
async fn store_requires_token() {
    assert!(matches!(session(None).store(), Err(Error::NotLoggedIn)));
    assert!(session(Some("abc")).store().is_ok());
}

#[test]
fn api_uses_configured_base_url() {
    let mut session = session(Some("abc"));
    session.config.server.api_url = "https://mail.example.com".into();
    assert_eq!(session.api().base_url(), "https://mail.example.com/api");
}

#[tokio::test]
async fn invalid_ws_url_is_reported() {
    let mut session = session(Some("abc"));
    session.config.server.ws_url = Some("ftp://mail.example.com".into());
    assert!(matches!(session.store(), Err(Error::Config(_))));
}

#[test]
fn malformed_config_file_fails_to_open() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "[server\n").unwrap();

    assert!(matches!(
        Session::open(Some(&path)),
        Err(Error::Config(_))
    ));
}
