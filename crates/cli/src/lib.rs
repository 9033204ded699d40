// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fmcli - The `firemail` command-line client.
//!
//! Commands build a [`MailboxStore`](fm_client::MailboxStore) from the
//! loaded configuration and stored token, run one operation against the
//! server and print the result.
//!
//! ```rust,ignore
//! use clap::Parser;
//! use fmcli::Cli;
//!
//! let cli = Cli::parse();
//! fmcli::logging::init(cli.verbose);
//! fmcli::run(cli).await?;
//! ```

mod cli;
mod commands;
mod display;
pub mod error;
pub mod logging;

pub use cli::{Cli, Command};
pub use error::{Error, Result};

use commands::Session;

/// Runs a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let session = Session::open(cli.config.as_deref())?;
    match cli.command {
        Command::Login { username, password } => {
            commands::auth::login(&session, &username, password).await
        }
        Command::Logout => commands::auth::logout(&session),
        Command::List { json } => commands::mailbox::list(&session, json).await,
        Command::Records { id, json, unread } => {
            commands::records::run(&session, id, json, unread).await
        }
        Command::Check { ids, all } => commands::mailbox::check(&session, &ids, all).await,
        Command::Delete { ids } => commands::mailbox::delete(&session, &ids).await,
        Command::Import { file, mail_type } => {
            commands::mailbox::import(&session, &file, &mail_type).await
        }
        Command::Read { mail_id } => commands::mailbox::mark_read(&session, mail_id).await,
        Command::Watch => commands::watch::run(&session).await,
    }
}
