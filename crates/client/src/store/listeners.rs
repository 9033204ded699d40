// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation of channel pushes into the store state.

use std::sync::atomic::Ordering;

use fm_core::{
    message_type, normalize_records, CheckProgress, EmailsDeleted, EmailsList, Envelope,
    ErrorNotice, MailRecordsPush,
};
use tracing::{debug, warn};

use super::{MailboxStore, WeakStore, CHANNEL_ERROR, LOG_TARGET};
use crate::channel::ChannelFailure;

/// Spawns a full refetch on behalf of a handler.
fn spawn_fetch_all(store: MailboxStore) {
    tokio::spawn(async move {
        if let Err(e) = store.fetch_all().await {
            warn!(target: LOG_TARGET, error = %e, "background refetch failed");
        }
    });
}

impl MailboxStore {
    /// Registers the channel handlers that keep the state in sync.
    ///
    /// Calling this more than once has no effect until [`reset`] removes
    /// the handlers.
    ///
    /// [`reset`]: MailboxStore::reset
    pub fn install_listeners(&self) {
        if self.inner.listeners_installed.swap(true, Ordering::SeqCst) {
            return;
        }
        let channel = &self.inner.channel;
        let mut ids = Vec::new();

        let weak = self.downgrade();
        ids.push(channel.on_connect(move || {
            if let Some(store) = weak.upgrade() {
                store.update(|s| s.connected = true);
                spawn_fetch_all(store);
            }
        }));

        let weak = self.downgrade();
        ids.push(channel.on_disconnect(move || {
            if let Some(store) = weak.upgrade() {
                store.update(|s| s.connected = false);
            }
        }));

        let weak = self.downgrade();
        ids.push(channel.on_message(message_type::EMAILS_LIST, move |msg| {
            with_payload::<EmailsList>(&weak, msg, |store, list| {
                store.update(|s| s.replace_emails(list.data));
            });
        }));

        for kind in [message_type::EMAIL_ADDED, message_type::EMAILS_IMPORTED] {
            let weak = self.downgrade();
            ids.push(channel.on_message(kind, move |_| {
                if let Some(store) = weak.upgrade() {
                    spawn_fetch_all(store);
                }
            }));
        }

        let weak = self.downgrade();
        ids.push(channel.on_message(message_type::EMAILS_DELETED, move |msg| {
            with_payload::<EmailsDeleted>(&weak, msg, |store, deleted| {
                store.update(|s| s.remove_emails(&deleted.email_ids));
            });
        }));

        let weak = self.downgrade();
        ids.push(channel.on_message(message_type::CHECK_PROGRESS, move |msg| {
            with_payload::<CheckProgress>(&weak, msg, |store, progress| {
                let email_id = progress.email_id;
                let complete = progress.is_complete();
                store.update(|s| s.set_progress(progress));
                if complete {
                    let settle = store.inner.config.progress_settle;
                    tokio::spawn(async move { store.refresh_after_check(email_id, settle).await });
                }
            });
        }));

        let weak = self.downgrade();
        ids.push(channel.on_message(message_type::MAIL_RECORDS, move |msg| {
            with_payload::<MailRecordsPush>(&weak, msg, |store, push| {
                let records = normalize_records(push.data);
                let mut applied = false;
                store.update(|s| applied = s.apply_records(push.email_id, records));
                if !applied {
                    debug!(target: LOG_TARGET, email_id = push.email_id, "ignoring records for another mailbox");
                }
            });
        }));

        let weak = self.downgrade();
        ids.push(channel.on_message(message_type::ERROR, move |msg| {
            if let Some(store) = weak.upgrade() {
                let notice = ErrorNotice::from_envelope(msg);
                let message = notice.message.unwrap_or_else(|| CHANNEL_ERROR.to_string());
                store.update(|s| s.error = Some(message));
            }
        }));

        let weak = self.downgrade();
        ids.push(channel.on_error(move |failure: &ChannelFailure| {
            // Transport errors are recovered by reconnecting; only giving up is user-visible
            if !matches!(failure, ChannelFailure::ReconnectExhausted { .. }) {
                debug!(target: LOG_TARGET, %failure, "channel recovering");
                return;
            }
            if let Some(store) = weak.upgrade() {
                store.update(|s| s.error = Some(failure.to_string()));
            }
        }));

        debug!(target: LOG_TARGET, count = ids.len(), "listeners installed");
        *self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = ids;
    }

    /// Unsubscribes every handler registered by [`install_listeners`].
    ///
    /// [`install_listeners`]: MailboxStore::install_listeners
    pub fn remove_listeners(&self) {
        let ids = std::mem::take(
            &mut *self
                .inner
                .subscriptions
                .lock()
                .unwrap_or_else(|e| e.into_inner()),
        );
        for id in ids {
            self.inner.channel.unsubscribe(id);
        }
        self.inner.listeners_installed.store(false, Ordering::SeqCst);
    }
}

/// Decodes `msg` and hands it to `apply` if the store is still alive.
fn with_payload<T: serde::de::DeserializeOwned>(
    weak: &WeakStore,
    msg: &Envelope,
    apply: impl FnOnce(MailboxStore, T),
) {
    let Some(store) = weak.upgrade() else {
        return;
    };
    match msg.decode::<T>() {
        Ok(payload) => apply(store, payload),
        Err(e) => warn!(target: LOG_TARGET, kind = %msg.kind, error = %e, "malformed push"),
    }
}
