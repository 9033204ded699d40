// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber registry for typed messages and lifecycle events.
//!
//! Handlers are kept per message type in insertion order. Dispatch works on
//! a snapshot taken under the lock, so a handler may subscribe or unsubscribe
//! while it runs without affecting the dispatch in progress.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use fm_core::Envelope;

/// Handle returned by every subscription; pass it to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Callback for a typed message.
pub type MessageHandler = Arc<dyn Fn(&Envelope) + Send + Sync>;

/// Callback for a lifecycle event.
pub type LifecycleHandler = Arc<dyn Fn(&LifecycleEvent) + Send + Sync>;

/// Connection lifecycle event kinds observers can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Connect,
    Disconnect,
    AuthSuccess,
    Error,
}

/// A lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Connected and authenticated.
    Connected,
    /// An open connection went away.
    Disconnected,
    /// The server accepted the token.
    Authenticated,
    /// A channel-level failure.
    Error(ChannelFailure),
}

impl LifecycleEvent {
    pub fn kind(&self) -> Lifecycle {
        match self {
            LifecycleEvent::Connected => Lifecycle::Connect,
            LifecycleEvent::Disconnected => Lifecycle::Disconnect,
            LifecycleEvent::Authenticated => Lifecycle::AuthSuccess,
            LifecycleEvent::Error(_) => Lifecycle::Error,
        }
    }
}

/// Failures reported to error observers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelFailure {
    /// Automatic reconnection gave up.
    #[error("unable to reach the server after {attempts} reconnect attempts")]
    ReconnectExhausted { attempts: u32 },

    /// The transport reported an error.
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Default)]
pub(crate) struct Registry {
    next_id: u64,
    handlers: HashMap<String, Vec<(SubscriptionId, MessageHandler)>>,
    observers: Vec<(SubscriptionId, Lifecycle, LifecycleHandler)>,
}

impl Registry {
    fn next_id(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    pub fn add_handler(&mut self, kind: &str, handler: MessageHandler) -> SubscriptionId {
        let id = self.next_id();
        self.handlers
            .entry(kind.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    pub fn add_observer(&mut self, kind: Lifecycle, handler: LifecycleHandler) -> SubscriptionId {
        let id = self.next_id();
        self.observers.push((id, kind, handler));
        id
    }

    /// Removes a subscription. Returns false if it was not registered.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.handlers.retain(|_, list| {
            let before = list.len();
            list.retain(|(sub, _)| *sub != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        let before = self.observers.len();
        self.observers.retain(|(sub, _, _)| *sub != id);
        removed || self.observers.len() != before
    }

    pub fn handlers_for(&self, kind: &str) -> Vec<MessageHandler> {
        self.handlers
            .get(kind)
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default()
    }

    pub fn observers_for(&self, kind: Lifecycle) -> Vec<LifecycleHandler> {
        self.observers
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| Arc::clone(h))
            .collect()
    }

    pub fn handler_count(&self, kind: &str) -> usize {
        self.handlers.get(kind).map_or(0, Vec::len)
    }
}

/// Shared registry handle used by both the channel handle and its task.
#[derive(Clone, Default)]
pub(crate) struct SharedRegistry(Arc<Mutex<Registry>>);

impl SharedRegistry {
    pub fn lock(&self) -> MutexGuard<'_, Registry> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs every handler for the message's type, in registration order.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, msg: &Envelope) -> usize {
        let handlers = self.lock().handlers_for(&msg.kind);
        for handler in &handlers {
            handler(msg);
        }
        handlers.len()
    }

    /// Runs every observer for the event's kind, in registration order.
    pub fn notify(&self, event: &LifecycleEvent) {
        let observers = self.lock().observers_for(event.kind());
        for observer in &observers {
            observer(event);
        }
    }
}

/// Removes its subscriptions when dropped.
pub(crate) struct SubscriptionGuard {
    registry: SharedRegistry,
    ids: Vec<SubscriptionId>,
}

impl SubscriptionGuard {
    pub fn new(registry: SharedRegistry, ids: Vec<SubscriptionId>) -> Self {
        SubscriptionGuard { registry, ids }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        let mut registry = self.registry.lock();
        for id in self.ids.drain(..) {
            registry.remove(id);
        }
    }
}
