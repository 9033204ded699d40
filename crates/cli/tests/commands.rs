// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line behavior that needs no server.

#![allow(clippy::unwrap_used)]

mod common;

use common::*;

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    firemail(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("watch"));
}

#[test]
fn list_without_token_fails() {
    let home = TempDir::new().unwrap();
    firemail(&home)
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("error: not logged in"));
}

#[test]
fn logout_without_token_succeeds() {
    let home = TempDir::new().unwrap();
    firemail(&home)
        .arg("logout")
        .assert()
        .success()
        .stdout("Logged out\n");
}

#[test]
fn malformed_config_is_reported() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("broken.toml");
    std::fs::write(&config, "[store]\nfetch_attempts = \"three\"\n").unwrap();

    firemail(&home)
        .arg("list")
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: configuration error"));
}

#[test]
fn empty_import_from_stdin_fails() {
    let home = TempDir::new().unwrap();
    firemail(&home)
        .args(["import", "-"])
        .env("FIREMAIL_TOKEN", "abc")
        .write_stdin("\n")
        .assert()
        .code(1)
        .stderr("error: stdin is empty\n");
}

#[test]
fn delete_needs_ids() {
    let home = TempDir::new().unwrap();
    firemail(&home).arg("delete").assert().code(2);
}
