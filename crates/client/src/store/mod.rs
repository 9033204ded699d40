// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox synchronization store.
//!
//! The store keeps the mailbox collection, the selection, per-mailbox check
//! progress and the records of the current mailbox consistent with the
//! server. Reads go over the channel first and fall back to the REST API;
//! push messages from the channel are reconciled into the same state.
//!
//! ```text
//! ┌────────────┐  request_response / send   ┌───────────────┐
//! │            │───────────────────────────▶│ ChannelClient │
//! │ MailboxStore                            └───────┬───────┘
//! │            │◀──────── push handlers ────────────┘
//! │            │  call (fallback)            ┌─────────────┐
//! │            │────────────────────────────▶│ FallbackApi │
//! └─────┬──────┘                             └─────────────┘
//!       │ watch::Sender<StoreState>
//!       ▼
//!   subscribers
//! ```

mod fetch;
mod listeners;
mod mutations;
mod state;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::watch;

use crate::api::{ApiError, FallbackApi};
use crate::channel::{ChannelClient, ChannelError, SubscriptionId};

pub use state::StoreState;

pub(crate) const LOG_TARGET: &str = "firemail::store";

/// Retry policy and timeouts for synchronization.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Channel attempts per fetch before the fallback API is used.
    pub fetch_attempts: u32,
    /// Pause after a failed channel attempt.
    pub retry_delay: Duration,
    pub list_timeout: Duration,
    pub records_timeout: Duration,
    /// Wait after a finished check before refetching.
    pub progress_settle: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            fetch_attempts: 3,
            retry_delay: Duration::from_millis(300),
            list_timeout: Duration::from_secs(10),
            records_timeout: Duration::from_secs(15),
            progress_settle: Duration::from_secs(1),
        }
    }
}

/// Result of a mutation the server accepted or is already running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationStatus {
    Accepted,
    /// The server is already processing this; carries its message.
    InProgress(String),
}

/// Error type for store operations.
///
/// The display text is the user-visible message also stored in
/// [`StoreState::error`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{action}")]
    Api {
        action: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("{action}")]
    Channel {
        action: &'static str,
        #[source]
        source: ChannelError,
    },
}

impl StoreError {
    pub(crate) fn api(action: &'static str) -> impl FnOnce(ApiError) -> Self {
        move |source| StoreError::Api { action, source }
    }
}

pub(crate) const FETCH_LIST_FAILED: &str = "failed to fetch mailbox list";
pub(crate) const FETCH_RECORDS_FAILED: &str = "failed to fetch mail records";
pub(crate) const ADD_FAILED: &str = "failed to add mailbox";
pub(crate) const IMPORT_FAILED: &str = "failed to import mailboxes";
pub(crate) const DELETE_FAILED: &str = "failed to delete mailbox";
pub(crate) const CHECK_FAILED: &str = "failed to check mailboxes";
pub(crate) const UPDATE_FAILED: &str = "failed to update mailbox";
pub(crate) const MARK_READ_FAILED: &str = "failed to mark mail as read";
pub(crate) const PASSWORD_FAILED: &str = "failed to fetch mailbox password";
pub(crate) const CHANNEL_ERROR: &str = "channel error";

struct Inner {
    channel: ChannelClient,
    api: Arc<dyn FallbackApi>,
    config: StoreConfig,
    state: watch::Sender<StoreState>,
    listeners_installed: AtomicBool,
    subscriptions: Mutex<Vec<SubscriptionId>>,
}

/// Handle to the store; clones share the same state.
#[derive(Clone)]
pub struct MailboxStore {
    inner: Arc<Inner>,
}

/// Non-owning handle held by channel handlers.
#[derive(Clone)]
struct WeakStore(Weak<Inner>);

impl WeakStore {
    fn upgrade(&self) -> Option<MailboxStore> {
        self.0.upgrade().map(|inner| MailboxStore { inner })
    }
}

impl MailboxStore {
    pub fn new(channel: ChannelClient, api: Arc<dyn FallbackApi>, config: StoreConfig) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        MailboxStore {
            inner: Arc::new(Inner {
                channel,
                api,
                config,
                state,
                listeners_installed: AtomicBool::new(false),
                subscriptions: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn channel(&self) -> &ChannelClient {
        &self.inner.channel
    }

    /// Current state snapshot.
    pub fn state(&self) -> StoreState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.inner.state.subscribe()
    }

    fn downgrade(&self) -> WeakStore {
        WeakStore(Arc::downgrade(&self.inner))
    }

    fn update(&self, f: impl FnOnce(&mut StoreState)) {
        self.inner.state.send_modify(f);
    }

    /// Marks an operation as started and clears the previous error.
    fn begin(&self) {
        self.update(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    /// Marks an operation as finished, recording `error` if it failed.
    fn finish<T>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        self.update(|s| {
            s.loading = false;
            if let Err(e) = &result {
                s.error = Some(e.to_string());
            }
        });
        result
    }

    /// Adds or removes a mailbox from the selection.
    ///
    /// Returns false if `id` is not in the collection.
    pub fn toggle_select(&self, id: i64) -> bool {
        let mut changed = false;
        self.update(|s| changed = s.toggle_select(id));
        changed
    }

    pub fn select_all(&self) {
        self.update(StoreState::select_all);
    }

    pub fn clear_selection(&self) {
        self.update(StoreState::clear_selection);
    }

    /// Clears all state and removes the installed listeners.
    pub fn reset(&self) {
        self.remove_listeners();
        self.update(|s| *s = StoreState::default());
    }
}

#[cfg(test)]
mod fetch_tests;
