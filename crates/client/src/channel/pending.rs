// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Requests held back until the connection is authenticated.
//!
//! Sends issued while the socket is open but authentication has not yet
//! succeeded are queued here and flushed in order right after the server
//! accepts the token. The queue belongs to one connection: tearing the
//! connection down discards whatever is still waiting.

use std::collections::VecDeque;

use fm_core::Envelope;

#[derive(Debug, Default)]
pub struct PendingQueue {
    requests: VecDeque<Envelope>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a request for sending after authentication.
    pub fn enqueue(&mut self, msg: Envelope) {
        self.requests.push_back(msg);
    }

    /// Take every queued request, oldest first.
    pub fn take_all(&mut self) -> Vec<Envelope> {
        self.requests.drain(..).collect()
    }

    /// Drop every queued request, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.requests.len();
        self.requests.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
