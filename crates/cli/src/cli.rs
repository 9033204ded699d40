// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Parse a server id: a positive integer.
fn positive_id(s: &str) -> Result<i64, String> {
    match s.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(format!("'{s}' is not a valid id")),
    }
}

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(name = "firemail")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Command-line client for a FireMail mailbox server")]
#[command(
    long_about = "Command-line client for a FireMail mailbox server.\n\n\
    Talks to the server over its real-time channel and falls back to the REST API \
    when the channel cannot answer."
)]
pub struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Log more (repeat for trace output)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Log in and store the session token
    #[command(after_help = "\
Examples:
  firemail login alice                 Prompt for the password on stdin
  firemail login alice -p secret       Pass the password directly")]
    Login {
        #[arg(value_parser = non_empty_string)]
        username: String,

        /// Password (read from stdin when omitted)
        #[arg(long, short)]
        password: Option<String>,
    },

    /// Forget the stored session token
    Logout,

    /// List mailboxes
    List {
        /// Print the mailboxes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the mail records of a mailbox
    Records {
        #[arg(value_parser = positive_id)]
        id: i64,

        /// Print the records as JSON
        #[arg(long)]
        json: bool,

        /// Only show unread records
        #[arg(long)]
        unread: bool,
    },

    /// Start a mail check for mailboxes
    #[command(after_help = "\
Examples:
  firemail check 3                     Check one mailbox
  firemail check 3 5 8                 Check several mailboxes
  firemail check 3 --all               Recheck every message of mailbox 3")]
    Check {
        #[arg(required = true, value_parser = positive_id)]
        ids: Vec<i64>,

        /// Recheck all messages, not only new ones
        #[arg(long)]
        all: bool,
    },

    /// Delete mailboxes
    Delete {
        #[arg(required = true, value_parser = positive_id)]
        ids: Vec<i64>,
    },

    /// Import mailboxes from a file, one per line
    #[command(after_help = "\
Examples:
  firemail import accounts.txt                     Import IMAP mailboxes
  firemail import outlook.txt --mail-type outlook  Import Outlook mailboxes
  cat accounts.txt | firemail import -             Read from stdin")]
    Import {
        /// File to read, or '-' for stdin
        file: PathBuf,

        /// Mail type of the imported mailboxes
        #[arg(long, default_value = "imap", value_parser = non_empty_string)]
        mail_type: String,
    },

    /// Mark a mail record as read
    Read {
        #[arg(value_parser = positive_id)]
        mail_id: i64,
    },

    /// Follow live updates from the server until interrupted
    Watch,
}
