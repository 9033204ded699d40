// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Dual-path reads: channel first, REST fallback second.

use std::time::Duration;

use fm_core::{
    message_type, normalize_records, EmailAccount, EmailsList, Envelope, MailRecordsPush,
    RawMailRecord,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{MailboxStore, StoreError, FETCH_LIST_FAILED, FETCH_RECORDS_FAILED, LOG_TARGET};
use crate::api::{endpoints, ApiError};
use crate::channel::CorrelatedRequest;

impl MailboxStore {
    /// Runs `request` over the channel up to the configured number of times.
    ///
    /// After each failure the channel is forced to reconnect and the store
    /// waits briefly before the next attempt.
    async fn request_with_retries<T>(
        &self,
        label: &'static str,
        request: CorrelatedRequest,
        decode: impl Fn(&Envelope) -> fm_core::Result<T>,
    ) -> Option<T> {
        let channel = &self.inner.channel;
        let attempts = self.inner.config.fetch_attempts.max(1);
        for attempt in 1..=attempts {
            let outcome = channel
                .request_response(request.clone())
                .await
                .map_err(|e| e.to_string())
                .and_then(|reply| decode(&reply).map_err(|e| e.to_string()));
            match outcome {
                Ok(value) => return Some(value),
                Err(error) => {
                    warn!(target: LOG_TARGET, label, attempt, %error, "channel attempt failed");
                    channel.reconnect();
                    tokio::time::sleep(self.inner.config.retry_delay).await;
                }
            }
        }
        None
    }

    /// Reloads the mailbox collection.
    ///
    /// On failure of both paths the previous collection is kept and the
    /// error is recorded in the state.
    pub async fn fetch_all(&self) -> Result<(), StoreError> {
        let started = tokio::time::Instant::now();
        self.begin();
        let result = self.load_emails().await;
        if let Ok(emails) = &result {
            let emails = emails.clone();
            self.update(|s| s.replace_emails(emails));
        }
        let result = self.finish(result.map(|_| ()));
        let state = self.state();
        debug!(
            target: LOG_TARGET,
            duration_ms = started.elapsed().as_millis() as u64,
            count = state.emails.len(),
            error = state.error.as_deref().unwrap_or(""),
            "fetch_all finished"
        );
        result
    }

    async fn load_emails(&self) -> Result<Vec<EmailAccount>, StoreError> {
        let request = CorrelatedRequest::new(Envelope::get_all_emails(), message_type::EMAILS_LIST)
            .timeout(self.inner.config.list_timeout);
        let decode = |reply: &Envelope| reply.decode::<EmailsList>().map(|list| list.data);
        if let Some(emails) = self.request_with_retries("emails_list", request, decode).await {
            return Ok(emails);
        }

        info!(target: LOG_TARGET, "falling back to the REST API for the mailbox list");
        let body = self
            .inner
            .api
            .call(endpoints::list_emails())
            .await
            .map_err(StoreError::api(FETCH_LIST_FAILED))?;
        serde_json::from_value(body).map_err(|e| StoreError::Api {
            action: FETCH_LIST_FAILED,
            source: ApiError::Decode(e.to_string()),
        })
    }

    /// Loads the records of `email_id` and makes it the current mailbox.
    ///
    /// A result that arrives after another mailbox became current is
    /// discarded.
    pub async fn fetch_records_for(&self, email_id: i64) -> Result<(), StoreError> {
        self.begin();
        self.update(|s| s.current_email_id = Some(email_id));

        let result = self.load_records(email_id).await;
        if let Ok(raw) = result.as_ref() {
            let records = normalize_records(raw.clone());
            let mut applied = false;
            self.update(|s| applied = s.apply_records(email_id, records));
            if !applied {
                debug!(target: LOG_TARGET, email_id, "discarding records for a mailbox no longer current");
            }
        }
        self.finish(result.map(|_| ()))
    }

    async fn load_records(&self, email_id: i64) -> Result<Vec<RawMailRecord>, StoreError> {
        let request = CorrelatedRequest::new(
            Envelope::get_mail_records(email_id),
            message_type::MAIL_RECORDS,
        )
        .matching(move |reply| reply.id_field("email_id") == Some(email_id))
        .timeout(self.inner.config.records_timeout);
        let decode = |reply: &Envelope| reply.decode::<MailRecordsPush>().map(|push| push.data);
        if let Some(records) = self.request_with_retries("mail_records", request, decode).await {
            return Ok(records);
        }

        info!(target: LOG_TARGET, email_id, "falling back to the REST API for mail records");
        let body = self
            .inner
            .api
            .call(endpoints::mail_records(email_id))
            .await
            .map_err(StoreError::api(FETCH_RECORDS_FAILED))?;
        match body {
            Value::Array(_) => serde_json::from_value(body).map_err(|e| StoreError::Api {
                action: FETCH_RECORDS_FAILED,
                source: ApiError::Decode(e.to_string()),
            }),
            _ => Ok(Vec::new()),
        }
    }

    /// Refetches the list and, if `email_id` is current, its records.
    pub(crate) async fn refresh_after_check(&self, email_id: i64, settle: Duration) {
        tokio::time::sleep(settle).await;
        if let Err(e) = self.fetch_all().await {
            warn!(target: LOG_TARGET, error = %e, "refetch after check failed");
        }
        if self.state().current_email_id == Some(email_id) {
            if let Err(e) = self.fetch_records_for(email_id).await {
                warn!(target: LOG_TARGET, email_id, error = %e, "records refetch after check failed");
            }
        }
    }
}
