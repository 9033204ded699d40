// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `firemail` with its config, data and token isolated in `home`.
pub fn firemail(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("firemail");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env_remove("FIREMAIL_TOKEN")
        .env_remove("FIREMAIL_API_URL")
        .env_remove("FIREMAIL_WS_URL")
        .env_remove("RUST_LOG");
    cmd
}
