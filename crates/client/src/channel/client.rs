// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Handle to the real-time channel.
//!
//! `ChannelClient` is cheap to clone. Every clone talks to the same
//! background task, which owns the transport and all timers. Status reads
//! are synchronous; everything that changes connection state is a command
//! processed in order by the task.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fm_core::{message_type, Envelope, ErrorNotice};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::debug;

use super::actor::{Actor, Command};
use super::registry::{
    ChannelFailure, Lifecycle, LifecycleEvent, LifecycleHandler, MessageHandler, SharedRegistry,
    SubscriptionGuard, SubscriptionId,
};
use super::transport::{Connector, WebSocketConnector};
use super::LOG_TARGET;
use crate::credentials::CredentialStore;

/// Default timeout for correlated requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// WebSocket URL of the server.
    pub url: String,
    /// Time allowed for the socket to open.
    pub connect_timeout: Duration,
    /// Delay between the socket opening and the authenticate message.
    pub auth_delay: Duration,
    /// Heartbeat probe interval. Zero disables the heartbeat.
    pub heartbeat_interval: Duration,
    /// Time allowed for a heartbeat response.
    pub heartbeat_timeout: Duration,
    /// First reconnect delay; doubles on every attempt.
    pub reconnect_base: Duration,
    /// Upper bound for the reconnect delay.
    pub reconnect_cap: Duration,
    /// Reconnect attempts before giving up (0 = unlimited).
    pub max_reconnect_attempts: u32,
    /// Delay between teardown and the fresh connect of `reconnect()`.
    pub reconnect_delay: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            url: "ws://localhost:8765".to_string(),
            connect_timeout: Duration::from_secs(10),
            auth_delay: Duration::from_millis(200),
            heartbeat_interval: Duration::from_secs(20),
            heartbeat_timeout: Duration::from_secs(10),
            reconnect_base: Duration::from_secs(1),
            reconnect_cap: Duration::from_secs(30),
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_millis(500),
        }
    }
}

/// State of the channel connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected and nothing scheduled.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Socket open, authentication not yet accepted.
    Connected,
    /// Socket open and the server accepted the token.
    Authenticated,
    /// Waiting to make reconnect attempt `attempt`.
    Reconnecting { attempt: u32 },
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            ConnectionState::Connected | ConnectionState::Authenticated
        )
    }

    pub fn is_authenticated(self) -> bool {
        self == ConnectionState::Authenticated
    }
}

/// Snapshot of the channel published after every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelStatus {
    pub state: ConnectionState,
    /// Consecutive reconnect attempts since the last successful open.
    pub reconnect_attempts: u32,
    /// Automatic reconnection gave up; only an explicit `connect()` resumes.
    pub exhausted: bool,
    /// When the connection last proved alive.
    pub last_heartbeat: Option<Instant>,
}

/// Outcome of a fire-and-forget send that did not reach the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// Not connected; a connection attempt was started and the message dropped.
    #[error("not connected")]
    NotConnected,

    /// Held until authentication succeeds, then sent in order.
    #[error("queued until authenticated")]
    Queued,

    /// No token is available to authenticate with.
    #[error("no authentication token")]
    NoToken,

    /// The transport rejected the message; a reconnect was scheduled.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The channel task has stopped.
    #[error("channel is shut down")]
    Shutdown,
}

/// Error type for correlated requests.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("channel not ready after {waited_ms}ms")]
    NotReady { waited_ms: u64 },

    #[error("send failed")]
    SendFailed(#[source] ChannelError),

    #[error("timed out after {0}ms")]
    TimedOut(u64),

    /// The server answered with an `error` message.
    #[error("{0}")]
    Server(String),

    #[error("channel is shut down")]
    Shutdown,
}

type Matcher = Arc<dyn Fn(&Envelope) -> bool + Send + Sync>;

/// A request whose reply is recognized by type and, optionally, by payload.
#[derive(Clone)]
pub struct CorrelatedRequest {
    pub message: Envelope,
    pub response_type: String,
    matcher: Option<Matcher>,
    pub timeout: Duration,
}

impl CorrelatedRequest {
    pub fn new(message: Envelope, response_type: impl Into<String>) -> Self {
        CorrelatedRequest {
            message,
            response_type: response_type.into(),
            matcher: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Only accept replies for which `matcher` returns true.
    pub fn matching(mut self, matcher: impl Fn(&Envelope) -> bool + Send + Sync + 'static) -> Self {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for CorrelatedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelatedRequest")
            .field("message", &self.message)
            .field("response_type", &self.response_type)
            .field("matcher", &self.matcher.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

type Settle = Arc<Mutex<Option<oneshot::Sender<Result<Envelope, RequestError>>>>>;

fn settle(slot: &Settle, result: Result<Envelope, RequestError>) {
    let sender = slot.lock().unwrap_or_else(|e| e.into_inner()).take();
    if let Some(sender) = sender {
        let _ = sender.send(result);
    }
}

/// Handle to the real-time channel.
#[derive(Clone)]
pub struct ChannelClient {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ChannelStatus>,
    registry: SharedRegistry,
}

impl ChannelClient {
    /// Spawns the channel task on the current runtime.
    ///
    /// Nothing connects until `connect()` is called or a send needs a connection.
    pub fn spawn(
        config: ChannelConfig,
        connector: Arc<dyn Connector>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ChannelStatus::default());
        let registry = SharedRegistry::default();

        let actor = Actor::new(
            config,
            connector,
            credentials,
            registry.clone(),
            status_tx,
            command_rx,
        );
        tokio::spawn(actor.run());

        ChannelClient {
            commands: command_tx,
            status: status_rx,
            registry,
        }
    }

    /// Spawns a channel over real WebSocket connections.
    pub fn websocket(config: ChannelConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::spawn(config, Arc::new(WebSocketConnector), credentials)
    }

    pub fn status(&self) -> ChannelStatus {
        *self.status.borrow()
    }

    pub fn state(&self) -> ConnectionState {
        self.status().state
    }

    /// True while the socket is open, authenticated or not.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    /// Receiver notified on every status change.
    pub fn watch_status(&self) -> watch::Receiver<ChannelStatus> {
        self.status.clone()
    }

    fn post(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Opens a connection unless one is open or in progress.
    ///
    /// Also re-arms automatic reconnection after it gave up.
    pub fn connect(&self) {
        self.post(Command::Connect { explicit: true });
    }

    /// Closes the connection intentionally; no reconnect follows.
    pub fn disconnect(&self) {
        self.post(Command::Disconnect);
    }

    /// Closes the connection and opens a fresh one after a short delay.
    pub fn reconnect(&self) {
        self.post(Command::Reconnect);
    }

    /// Sends a fire-and-forget message.
    pub async fn send(&self, message: Envelope) -> Result<(), ChannelError> {
        let (reply, rx) = oneshot::channel();
        if !self.post(Command::Send { message, reply }) {
            return Err(ChannelError::Shutdown);
        }
        rx.await.unwrap_or(Err(ChannelError::Shutdown))
    }

    /// Waits until the channel is authenticated, starting a connection if needed.
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<(), RequestError> {
        if self.is_authenticated() {
            return Ok(());
        }
        self.post(Command::Connect { explicit: false });

        let mut status = self.status.clone();
        let ready = async move {
            status
                .wait_for(|s| s.state.is_authenticated())
                .await
                .map(|_| ())
        };
        match tokio::time::timeout(timeout, ready).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(RequestError::Shutdown),
            Err(_) => Err(RequestError::NotReady {
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Sends a request and waits for the first matching reply.
    ///
    /// Settles exactly once: with the matching reply, with the first `error`
    /// message, or with a send failure or timeout. The temporary handlers are
    /// removed in every case, including when the returned future is dropped.
    pub async fn request_response(&self, request: CorrelatedRequest) -> Result<Envelope, RequestError> {
        let CorrelatedRequest {
            message,
            response_type,
            matcher,
            timeout,
        } = request;

        self.wait_until_ready(timeout).await?;

        let (tx, rx) = oneshot::channel();
        let slot: Settle = Arc::new(Mutex::new(Some(tx)));

        let on_response: MessageHandler = {
            let slot = Arc::clone(&slot);
            Arc::new(move |msg: &Envelope| {
                if matcher.as_ref().is_some_and(|m| !m(msg)) {
                    return;
                }
                settle(&slot, Ok(msg.clone()));
            })
        };
        let on_error: MessageHandler = {
            let slot = Arc::clone(&slot);
            Arc::new(move |msg: &Envelope| {
                let text = ErrorNotice::from_envelope(msg)
                    .message
                    .unwrap_or_else(|| "request failed".to_string());
                settle(&slot, Err(RequestError::Server(text)));
            })
        };
        let _guard = {
            let mut registry = self.registry.lock();
            let ids = vec![
                registry.add_handler(&response_type, on_response),
                registry.add_handler(message_type::ERROR, on_error),
            ];
            SubscriptionGuard::new(self.registry.clone(), ids)
        };

        let kind = message.kind.clone();
        if let Err(e) = self.send(message).await {
            debug!(target: LOG_TARGET, %kind, error = %e, "request not sent");
            return Err(RequestError::SendFailed(e));
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(RequestError::Shutdown),
            Err(_) => {
                debug!(target: LOG_TARGET, %kind, %response_type, "request timed out");
                Err(RequestError::TimedOut(timeout.as_millis() as u64))
            }
        }
    }

    /// Subscribes to messages of one type.
    pub fn on_message(
        &self,
        kind: &str,
        handler: impl Fn(&Envelope) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.registry.lock().add_handler(kind, Arc::new(handler))
    }

    fn observe(&self, kind: Lifecycle, handler: LifecycleHandler) -> SubscriptionId {
        self.registry.lock().add_observer(kind, handler)
    }

    /// Runs `handler` each time the channel becomes connected and
    /// authenticated, and right away if it already is.
    pub fn on_connect(&self, handler: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let handler: LifecycleHandler = Arc::new(move |_: &LifecycleEvent| handler());
        let id = self.observe(Lifecycle::Connect, Arc::clone(&handler));
        if self.is_authenticated() {
            handler(&LifecycleEvent::Connected);
        }
        id
    }

    /// Runs `handler` each time an open connection goes away.
    pub fn on_disconnect(&self, handler: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.observe(
            Lifecycle::Disconnect,
            Arc::new(move |_: &LifecycleEvent| handler()),
        )
    }

    /// Runs `handler` each time authentication succeeds, and right away if
    /// the channel is already authenticated.
    pub fn on_auth_success(&self, handler: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let handler: LifecycleHandler = Arc::new(move |_: &LifecycleEvent| handler());
        let id = self.observe(Lifecycle::AuthSuccess, Arc::clone(&handler));
        if self.is_authenticated() {
            handler(&LifecycleEvent::Authenticated);
        }
        id
    }

    /// Runs `handler` for channel-level failures.
    pub fn on_error(
        &self,
        handler: impl Fn(&ChannelFailure) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.observe(
            Lifecycle::Error,
            Arc::new(move |event: &LifecycleEvent| {
                if let LifecycleEvent::Error(failure) = event {
                    handler(failure);
                }
            }),
        )
    }

    /// Removes a subscription made by any `on_*` method.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.registry.lock().remove(id)
    }

    /// Number of handlers currently registered for a message type.
    pub fn handler_count(&self, kind: &str) -> usize {
        self.registry.lock().handler_count(kind)
    }

    /// Disconnects and stops the channel task.
    pub async fn shutdown(&self) {
        let (done, rx) = oneshot::channel();
        if self.post(Command::Shutdown { done }) {
            let _ = rx.await;
        }
    }
}
