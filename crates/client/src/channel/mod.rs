// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Resilient real-time channel to the FireMail server.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐ commands ┌─────────────┐     ┌─────────────┐
//! │ ChannelClient │─────────►│ channel task│────►│  Transport  │
//! │   (handles)   │◄─────────│   (Actor)   │◄────│   (trait)   │
//! └───────────────┘  status  └─────────────┘     └─────────────┘
//!         │                        │
//!         ▼                        ▼
//! ┌───────────────┐          ┌─────────────┐
//! │   Registry    │◄─────────│   Pending   │  (held until authenticated)
//! │  (handlers)   │ dispatch │    queue    │
//! └───────────────┘          └─────────────┘
//! ```
//!
//! # Features
//!
//! - Token authentication after the socket opens
//! - Heartbeat probes with a response deadline
//! - Automatic reconnect with capped exponential backoff
//! - Correlated request/response over typed push messages
//! - Injectable connector for testing

mod actor;
mod backoff;
mod client;
mod pending;
mod registry;
mod transport;

pub use backoff::backoff_delay;
pub use client::{
    ChannelClient, ChannelConfig, ChannelError, ChannelStatus, ConnectionState, CorrelatedRequest,
    RequestError, DEFAULT_REQUEST_TIMEOUT,
};
pub use registry::{ChannelFailure, LifecycleEvent, SubscriptionId};
pub use transport::{
    Connector, Transport, TransportError, TransportFuture, TransportResult, WebSocketConnector,
    WebSocketTransport,
};

pub(crate) const LOG_TARGET: &str = "firemail::channel";
