// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::io::Cursor;
use std::path::PathBuf;

use tempfile::TempDir;
use yare::parameterized;

use super::*;

#[parameterized(
    one = { 1, "" },
    zero = { 0, "es" },
    many = { 3, "es" },
)]
fn plural_suffix(n: usize, expected: &str) {
    assert_eq!(plural(n), expected);
}

#[test]
fn accepted_status_uses_given_text() {
    assert_eq!(
        describe_status(&MutationStatus::Accepted, "Deleted 2 mailboxes"),
        "Deleted 2 mailboxes"
    );
}

#[test]
fn in_progress_status_shows_server_message() {
    let status = MutationStatus::InProgress("mailbox 3 is being checked".into());
    assert_eq!(
        describe_status(&status, "unused"),
        "Already in progress: mailbox 3 is being checked"
    );
}

#[test]
fn import_data_from_file_is_trimmed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("accounts.txt");
    std::fs::write(&path, "\na@x.com----pw\nb@x.com----pw\n\n").unwrap();

    let data = read_import_data(&path, Cursor::new("")).unwrap();

    assert_eq!(data, "a@x.com----pw\nb@x.com----pw");
}

#[test]
fn import_data_from_stdin() {
    let data = read_import_data(&PathBuf::from("-"), Cursor::new("c@x.com----pw\n")).unwrap();
    assert_eq!(data, "c@x.com----pw");
}

#[test]
fn empty_import_is_rejected() {
    let err = read_import_data(&PathBuf::from("-"), Cursor::new("  \n")).unwrap_err();
    assert_eq!(err.to_string(), "stdin is empty");
}

#[test]
fn missing_import_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let err = read_import_data(&temp.path().join("absent.txt"), Cursor::new("")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}
