// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Log output for the CLI.
//!
//! Logs go to stderr so command output on stdout stays parseable.
//! `RUST_LOG` takes precedence over the verbosity flag.

use tracing_subscriber::EnvFilter;

/// Default filter directive for a `-v` count.
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. Safe to call more than once.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 0)
        .try_init();
}
