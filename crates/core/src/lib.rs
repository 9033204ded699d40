// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fm-core: Shared types for the FireMail client.
//!
//! This crate provides the wire protocol spoken over the real-time channel,
//! the mailbox and mail record models, and record normalization. It has no
//! I/O of its own; the channel, fallback API and store live in `fm-client`.

pub mod error;
mod lenient;
pub mod models;
pub mod protocol;

pub use error::{Error, Result};
pub use models::{
    normalize_records, EmailAccount, MailRecord, RawMailRecord, RecordId, DEFAULT_CONTENT,
    DEFAULT_FOLDER, DEFAULT_SENDER, DEFAULT_SUBJECT,
};
pub use protocol::{
    message_type, AuthResult, CheckProgress, EmailsDeleted, EmailsList, Envelope, ErrorNotice,
    MailRecordsPush, NOT_AUTHENTICATED_CODE, NOT_AUTHENTICATED_TEXT,
};
