// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Mutations routed over the channel when it is connected, otherwise over
//! the REST API.

use fm_core::{EmailAccount, Envelope};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{
    MailboxStore, MutationStatus, StoreError, ADD_FAILED, CHECK_FAILED, DELETE_FAILED,
    IMPORT_FAILED, LOG_TARGET, MARK_READ_FAILED, PASSWORD_FAILED, UPDATE_FAILED,
};
use crate::api::{endpoints, ApiError, ApiRequest};
use crate::channel::ChannelError;

/// Mail type assumed for mailboxes added without one.
const DEFAULT_MAIL_TYPE: &str = "imap";

/// Maps a 409 to `InProgress`; everything else stays an error.
fn conflict_as_status(result: Result<Value, ApiError>) -> Result<MutationStatus, ApiError> {
    match result {
        Ok(_) => Ok(MutationStatus::Accepted),
        Err(ApiError::Conflict(message)) => Ok(MutationStatus::InProgress(message)),
        Err(e) => Err(e),
    }
}

/// JavaScript-style truthiness for loosely typed flags.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl MailboxStore {
    /// Sends `message` over the channel if it is connected, otherwise calls
    /// the API with `request`.
    async fn route(
        &self,
        action: &'static str,
        message: Envelope,
        request: ApiRequest,
    ) -> Result<MutationStatus, StoreError> {
        let channel = &self.inner.channel;
        if channel.is_connected() {
            let kind = message.kind.clone();
            match channel.send(message).await {
                Ok(()) => return Ok(MutationStatus::Accepted),
                Err(ChannelError::Queued) => {
                    debug!(target: LOG_TARGET, %kind, "queued until authenticated");
                    return Ok(MutationStatus::Accepted);
                }
                Err(ChannelError::NotConnected) => {
                    info!(target: LOG_TARGET, %kind, "channel dropped; using the REST API");
                }
                Err(source) => return Err(StoreError::Channel { action, source }),
            }
        }
        conflict_as_status(self.inner.api.call(request).await).map_err(StoreError::api(action))
    }

    async fn run_mutation(
        &self,
        action: &'static str,
        message: Envelope,
        request: ApiRequest,
    ) -> Result<MutationStatus, StoreError> {
        self.begin();
        let result = self.route(action, message, request).await;
        self.finish(result)
    }

    /// Adds a mailbox. The account is an opaque JSON object; `mail_type`
    /// defaults to `imap` on the channel path.
    pub async fn add_email(&self, account: Map<String, Value>) -> Result<MutationStatus, StoreError> {
        let mut payload = account.clone();
        let has_type = payload
            .get("mail_type")
            .and_then(Value::as_str)
            .is_some_and(|t| !t.is_empty());
        if !has_type {
            payload.insert("mail_type".into(), DEFAULT_MAIL_TYPE.into());
        }
        self.run_mutation(
            ADD_FAILED,
            Envelope::add_email(Value::Object(payload)),
            endpoints::add_email(Value::Object(account)),
        )
        .await
    }

    /// Imports mailboxes from the server's line-based import format.
    pub async fn import_emails(
        &self,
        data: &str,
        mail_type: &str,
    ) -> Result<MutationStatus, StoreError> {
        self.run_mutation(
            IMPORT_FAILED,
            Envelope::import_emails(data, mail_type),
            endpoints::import_emails(data, mail_type),
        )
        .await
    }

    pub async fn delete_email(&self, email_id: i64) -> Result<MutationStatus, StoreError> {
        self.delete_emails(&[email_id]).await
    }

    /// Deletes mailboxes and, once accepted, removes them from the
    /// collection and the selection.
    pub async fn delete_emails(&self, email_ids: &[i64]) -> Result<MutationStatus, StoreError> {
        if email_ids.is_empty() {
            return Ok(MutationStatus::Accepted);
        }
        let status = self
            .run_mutation(
                DELETE_FAILED,
                Envelope::delete_emails(email_ids),
                endpoints::delete_emails(email_ids),
            )
            .await?;
        if status == MutationStatus::Accepted {
            self.update(|s| s.remove_emails(email_ids));
        }
        Ok(status)
    }

    /// Starts a mail check for the given mailboxes.
    pub async fn check_emails(&self, email_ids: &[i64]) -> Result<MutationStatus, StoreError> {
        if email_ids.is_empty() {
            return Ok(MutationStatus::Accepted);
        }
        self.run_mutation(
            CHECK_FAILED,
            Envelope::check_emails(email_ids),
            endpoints::check_emails(email_ids),
        )
        .await
    }

    /// Checks one mailbox through the REST API.
    pub async fn check_email(&self, email_id: i64) -> Result<MutationStatus, StoreError> {
        conflict_as_status(self.inner.api.call(endpoints::check_emails(&[email_id])).await)
            .map_err(StoreError::api(CHECK_FAILED))
    }

    /// Rechecks every message of a mailbox, not only new ones.
    pub async fn recheck_all(&self, email_id: i64) -> Result<MutationStatus, StoreError> {
        conflict_as_status(self.inner.api.call(endpoints::recheck_all(email_id)).await)
            .map_err(StoreError::api(CHECK_FAILED))
    }

    /// Marks a record read on the server, then locally.
    pub async fn mark_read(&self, mail_id: i64) -> Result<(), StoreError> {
        self.inner
            .api
            .call(endpoints::mark_read(mail_id))
            .await
            .map_err(StoreError::api(MARK_READ_FAILED))?;
        self.update(|s| s.mark_record_read(mail_id));
        Ok(())
    }

    /// Saves an edited mailbox and merges it into the collection.
    pub async fn update_email(&self, account: EmailAccount) -> Result<(), StoreError> {
        let mut account = account;
        if account.is_imap() {
            if let Some(flag) = account.extra.get("use_ssl") {
                let coerced = truthy(flag);
                account.extra.insert("use_ssl".into(), Value::Bool(coerced));
            }
        }
        let body = serde_json::to_value(&account).map_err(|e| StoreError::Api {
            action: UPDATE_FAILED,
            source: ApiError::Decode(e.to_string()),
        })?;
        self.inner
            .api
            .call(endpoints::update_email(account.id, body.clone()))
            .await
            .map_err(StoreError::api(UPDATE_FAILED))?;

        if let Value::Object(patch) = body {
            self.update(|s| {
                if let Some(existing) = s.emails.iter_mut().find(|e| e.id == account.id) {
                    if existing.apply_patch(&patch).is_err() {
                        *existing = account;
                    }
                }
            });
        }
        Ok(())
    }

    /// Fetches the stored password of a mailbox.
    pub async fn email_password(&self, email_id: i64) -> Result<Value, StoreError> {
        self.inner
            .api
            .call(endpoints::email_password(email_id))
            .await
            .map_err(StoreError::api(PASSWORD_FAILED))
    }
}
