// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background task that owns the connection.
//!
//! The task runs one `select!` loop over handle commands, connect outcomes,
//! inbound frames and timer deadlines. All connection state lives here, so
//! every change is serialized without locks.
//!
//! Each connection attempt gets a new generation number. Connect outcomes and
//! connection-scoped timers carry the generation they were created for and
//! are ignored once the channel has moved on.

use std::sync::Arc;
use std::time::Duration;

use fm_core::{message_type, AuthResult, Envelope, ErrorNotice};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::backoff::backoff_delay;
use super::client::{ChannelConfig, ChannelError, ChannelStatus, ConnectionState};
use super::pending::PendingQueue;
use super::registry::{ChannelFailure, LifecycleEvent, SharedRegistry};
use super::transport::{Connector, Transport, TransportError, TransportResult};
use super::LOG_TARGET;
use crate::credentials::CredentialStore;

/// Upper bound on a graceful close before the transport is dropped.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

pub(crate) enum Command {
    Connect {
        explicit: bool,
    },
    Disconnect,
    Reconnect,
    Send {
        message: Envelope,
        reply: oneshot::Sender<Result<(), ChannelError>>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

struct ConnectAttempt {
    generation: u64,
    cancel: CancellationToken,
}

struct ConnectOutcome {
    generation: u64,
    result: TransportResult<Box<dyn Transport>>,
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    at: Instant,
    generation: u64,
}

#[derive(Debug, Default)]
struct Timers {
    auth: Option<Timer>,
    heartbeat: Option<Timer>,
    heartbeat_deadline: Option<Timer>,
    reconnect: Option<Instant>,
    delayed_connect: Option<Instant>,
}

impl Timers {
    fn clear_connection(&mut self) {
        self.auth = None;
        self.heartbeat = None;
        self.heartbeat_deadline = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closure {
    /// Requested by the client; no automatic reconnect.
    Intentional,
    /// Anything else; schedules a reconnect.
    Lost,
}

pub(crate) struct Actor {
    config: ChannelConfig,
    connector: Arc<dyn Connector>,
    credentials: Arc<dyn CredentialStore>,
    registry: SharedRegistry,
    status: watch::Sender<ChannelStatus>,
    commands: mpsc::UnboundedReceiver<Command>,
    outcome_tx: mpsc::UnboundedSender<ConnectOutcome>,
    outcomes: mpsc::UnboundedReceiver<ConnectOutcome>,

    conn: Option<Box<dyn Transport>>,
    attempt: Option<ConnectAttempt>,
    generation: u64,
    authenticated: bool,
    auth_attempted: bool,
    reconnect_attempts: u32,
    exhausted: bool,
    pending: PendingQueue,
    timers: Timers,
    last_heartbeat: Option<Instant>,
    probe_answered: bool,
}

async fn wait_until(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn recv_frame(conn: &mut Option<Box<dyn Transport>>) -> TransportResult<Option<Envelope>> {
    match conn {
        Some(transport) => transport.recv().await,
        None => std::future::pending().await,
    }
}

/// Opens one transport and reports the outcome back to the channel task.
async fn open_transport(
    mut transport: Box<dyn Transport>,
    url: String,
    timeout: Duration,
    cancel: CancellationToken,
    generation: u64,
    outcome_tx: mpsc::UnboundedSender<ConnectOutcome>,
) {
    let attempt = tokio::select! {
        _ = cancel.cancelled() => return,
        result = tokio::time::timeout(timeout, transport.connect(&url)) => result,
    };
    let result = match attempt {
        Ok(Ok(())) => Ok(transport),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(TransportError::ConnectionFailed(format!(
            "timed out after {}ms",
            timeout.as_millis()
        ))),
    };
    let _ = outcome_tx.send(ConnectOutcome { generation, result });
}

impl Actor {
    pub fn new(
        config: ChannelConfig,
        connector: Arc<dyn Connector>,
        credentials: Arc<dyn CredentialStore>,
        registry: SharedRegistry,
        status: watch::Sender<ChannelStatus>,
        commands: mpsc::UnboundedReceiver<Command>,
    ) -> Self {
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        Actor {
            config,
            connector,
            credentials,
            registry,
            status,
            commands,
            outcome_tx,
            outcomes,
            conn: None,
            attempt: None,
            generation: 0,
            authenticated: false,
            auth_attempted: false,
            reconnect_attempts: 0,
            exhausted: false,
            pending: PendingQueue::new(),
            timers: Timers::default(),
            last_heartbeat: None,
            probe_answered: true,
        }
    }

    pub async fn run(mut self) {
        debug!(target: LOG_TARGET, url = %self.config.url, "channel task started");

        loop {
            let auth_at = self.timers.auth.map(|t| t.at);
            let heartbeat_at = self.timers.heartbeat.map(|t| t.at);
            let deadline_at = self.timers.heartbeat_deadline.map(|t| t.at);
            let reconnect_at = self.timers.reconnect;
            let delayed_at = self.timers.delayed_connect;

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown { done }) => {
                        self.shut_down().await;
                        let _ = done.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                    None => {
                        self.shut_down().await;
                        break;
                    }
                },

                Some(outcome) = self.outcomes.recv() => self.handle_connect_outcome(outcome),

                frame = recv_frame(&mut self.conn) => self.handle_frame(frame).await,

                _ = wait_until(auth_at) => self.on_auth_timer().await,

                _ = wait_until(heartbeat_at) => self.on_heartbeat_timer().await,

                _ = wait_until(deadline_at) => self.on_heartbeat_deadline().await,

                _ = wait_until(reconnect_at) => {
                    self.timers.reconnect = None;
                    self.reconnect_attempts = self.reconnect_attempts.saturating_add(1);
                    info!(target: LOG_TARGET, attempt = self.reconnect_attempts, "reconnecting");
                    self.start_connect(false);
                }

                _ = wait_until(delayed_at) => {
                    self.timers.delayed_connect = None;
                    self.start_connect(false);
                }
            }
        }

        debug!(target: LOG_TARGET, "channel task stopped");
    }

    async fn shut_down(&mut self) {
        self.timers.reconnect = None;
        self.timers.delayed_connect = None;
        self.teardown(Closure::Intentional).await;
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect { explicit } => self.start_connect(explicit),
            Command::Disconnect => {
                self.shut_down().await;
                info!(target: LOG_TARGET, "disconnected");
            }
            Command::Reconnect => {
                self.shut_down().await;
                self.timers.delayed_connect = Some(Instant::now() + self.config.reconnect_delay);
                debug!(
                    target: LOG_TARGET,
                    delay_ms = self.config.reconnect_delay.as_millis() as u64,
                    "reconnect requested"
                );
            }
            Command::Send { message, reply } => {
                let result = self.handle_send(message).await;
                let _ = reply.send(result);
            }
            // Handled by the run loop
            Command::Shutdown { done } => {
                let _ = done.send(());
            }
        }
    }

    fn publish(&self) {
        let state = if self.conn.is_some() {
            if self.authenticated {
                ConnectionState::Authenticated
            } else {
                ConnectionState::Connected
            }
        } else if self.attempt.is_some() {
            ConnectionState::Connecting
        } else if self.timers.reconnect.is_some() {
            ConnectionState::Reconnecting {
                attempt: self.reconnect_attempts.saturating_add(1),
            }
        } else {
            ConnectionState::Disconnected
        };
        let next = ChannelStatus {
            state,
            reconnect_attempts: self.reconnect_attempts,
            exhausted: self.exhausted,
            last_heartbeat: self.last_heartbeat,
        };
        self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn start_connect(&mut self, explicit: bool) {
        if explicit && self.exhausted {
            info!(target: LOG_TARGET, "reconnection re-armed");
            self.exhausted = false;
            self.reconnect_attempts = 0;
        }
        if self.conn.is_some() || self.attempt.is_some() {
            debug!(target: LOG_TARGET, "connect skipped: already connected or connecting");
            self.publish();
            return;
        }
        if self.credentials.token().is_none() {
            warn!(target: LOG_TARGET, "connect skipped: no token");
            self.publish();
            return;
        }

        self.timers.reconnect = None;
        self.generation += 1;
        let generation = self.generation;
        let cancel = CancellationToken::new();
        self.attempt = Some(ConnectAttempt {
            generation,
            cancel: cancel.clone(),
        });
        self.publish();

        debug!(target: LOG_TARGET, generation, url = %self.config.url, "connecting");
        tokio::spawn(open_transport(
            self.connector.create(),
            self.config.url.clone(),
            self.config.connect_timeout,
            cancel,
            generation,
            self.outcome_tx.clone(),
        ));
    }

    fn handle_connect_outcome(&mut self, outcome: ConnectOutcome) {
        let current = self
            .attempt
            .as_ref()
            .is_some_and(|a| a.generation == outcome.generation);
        if !current {
            debug!(target: LOG_TARGET, generation = outcome.generation, "ignoring stale connect outcome");
            return;
        }
        self.attempt = None;

        match outcome.result {
            Ok(transport) => {
                let now = Instant::now();
                self.conn = Some(transport);
                self.reconnect_attempts = 0;
                self.exhausted = false;
                self.authenticated = false;
                self.auth_attempted = false;
                self.last_heartbeat = Some(now);
                self.probe_answered = true;
                self.timers.auth = Some(Timer {
                    at: now + self.config.auth_delay,
                    generation: self.generation,
                });
                if !self.config.heartbeat_interval.is_zero() {
                    self.timers.heartbeat = Some(Timer {
                        at: now + self.config.heartbeat_interval,
                        generation: self.generation,
                    });
                }
                self.publish();
                info!(target: LOG_TARGET, generation = self.generation, "connected");
            }
            Err(e) => {
                warn!(target: LOG_TARGET, error = %e, "connection attempt failed");
                self.publish();
                self.schedule_reconnect();
            }
        }
    }

    async fn handle_frame(&mut self, frame: TransportResult<Option<Envelope>>) {
        match frame {
            Ok(Some(message)) => self.handle_message(message).await,
            Ok(None) => {
                info!(target: LOG_TARGET, "connection closed by server");
                self.teardown(Closure::Lost).await;
            }
            Err(e) if e.is_recoverable() => {
                warn!(target: LOG_TARGET, error = %e, "dropping undecodable frame");
            }
            Err(e) => {
                warn!(target: LOG_TARGET, error = %e, "connection error");
                self.registry
                    .notify(&LifecycleEvent::Error(ChannelFailure::Transport(e.to_string())));
                self.teardown(Closure::Lost).await;
            }
        }
    }

    async fn handle_message(&mut self, message: Envelope) {
        match message.kind.as_str() {
            message_type::HEARTBEAT_RESPONSE => {
                self.last_heartbeat = Some(Instant::now());
                self.probe_answered = true;
                self.timers.heartbeat_deadline = None;
                self.publish();
            }
            message_type::AUTH_RESULT => self.handle_auth_result(&message).await,
            message_type::CONNECTION_ESTABLISHED => {
                debug!(target: LOG_TARGET, "server greeted connection");
            }
            message_type::ERROR if ErrorNotice::from_envelope(&message).is_not_authenticated() => {
                info!(target: LOG_TARGET, "server requires authentication; re-authenticating");
                self.authenticated = false;
                self.schedule_auth();
                self.publish();
            }
            kind => {
                let handled = self.registry.dispatch(&message);
                if handled == 0 {
                    debug!(target: LOG_TARGET, kind, "no handlers for message");
                }
            }
        }
    }

    async fn handle_auth_result(&mut self, message: &Envelope) {
        let result: AuthResult = message.decode().unwrap_or(AuthResult {
            success: false,
            message: None,
        });

        if !result.success {
            self.authenticated = false;
            self.publish();
            warn!(
                target: LOG_TARGET,
                reason = result.message.as_deref().unwrap_or("none given"),
                "authentication rejected"
            );
            return;
        }

        self.authenticated = true;
        self.timers.auth = None;
        self.publish();
        info!(target: LOG_TARGET, "authenticated");

        self.registry.notify(&LifecycleEvent::Authenticated);
        self.registry.notify(&LifecycleEvent::Connected);

        let queued = self.pending.take_all();
        if !queued.is_empty() {
            debug!(target: LOG_TARGET, count = queued.len(), "flushing queued requests");
        }
        for message in queued {
            if let Err(e) = self.transmit(message).await {
                warn!(target: LOG_TARGET, error = %e, "failed to flush queued request");
                self.teardown(Closure::Lost).await;
                return;
            }
        }
    }

    async fn handle_send(&mut self, message: Envelope) -> Result<(), ChannelError> {
        if self.conn.is_none() {
            debug!(target: LOG_TARGET, kind = %message.kind, "send while disconnected; connecting");
            self.start_connect(false);
            return Err(ChannelError::NotConnected);
        }

        if !self.authenticated {
            if self.credentials.token().is_none() {
                warn!(target: LOG_TARGET, kind = %message.kind, "send dropped: no token");
                return Err(ChannelError::NoToken);
            }
            debug!(target: LOG_TARGET, kind = %message.kind, "queueing until authenticated");
            self.pending.enqueue(message);
            self.schedule_auth();
            return Err(ChannelError::Queued);
        }

        match self.transmit(message).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(target: LOG_TARGET, error = %e, "send failed");
                self.teardown(Closure::Lost).await;
                Err(ChannelError::SendFailed(e.to_string()))
            }
        }
    }

    async fn transmit(&mut self, message: Envelope) -> TransportResult<()> {
        match self.conn.as_mut() {
            Some(transport) => transport.send(message).await,
            None => Err(TransportError::ConnectionClosed),
        }
    }

    fn schedule_auth(&mut self) {
        self.timers.auth = Some(Timer {
            at: Instant::now() + self.config.auth_delay,
            generation: self.generation,
        });
    }

    fn take_current(slot: &mut Option<Timer>, generation: u64) -> bool {
        slot.take().is_some_and(|t| t.generation == generation)
    }

    async fn on_auth_timer(&mut self) {
        if !Self::take_current(&mut self.timers.auth, self.generation) || self.conn.is_none() {
            return;
        }
        let Some(token) = self.credentials.token() else {
            warn!(target: LOG_TARGET, "authentication skipped: no token");
            return;
        };

        debug!(target: LOG_TARGET, retry = self.auth_attempted, "sending authentication");
        match self.transmit(Envelope::authenticate(token)).await {
            Ok(()) => self.auth_attempted = true,
            Err(e) => {
                warn!(target: LOG_TARGET, error = %e, "failed to send authentication");
                self.teardown(Closure::Lost).await;
            }
        }
    }

    async fn on_heartbeat_timer(&mut self) {
        if !Self::take_current(&mut self.timers.heartbeat, self.generation) || self.conn.is_none() {
            return;
        }

        let now = Instant::now();
        self.timers.heartbeat = Some(Timer {
            at: now + self.config.heartbeat_interval,
            generation: self.generation,
        });

        match self.transmit(Envelope::heartbeat()).await {
            Ok(()) => {
                self.probe_answered = false;
                self.timers.heartbeat_deadline = Some(Timer {
                    at: now + self.config.heartbeat_timeout,
                    generation: self.generation,
                });
            }
            Err(e) => {
                warn!(target: LOG_TARGET, error = %e, "heartbeat send failed; reconnecting");
                self.restart().await;
            }
        }
    }

    async fn on_heartbeat_deadline(&mut self) {
        if !Self::take_current(&mut self.timers.heartbeat_deadline, self.generation) {
            return;
        }
        if !self.probe_answered {
            warn!(
                target: LOG_TARGET,
                timeout_ms = self.config.heartbeat_timeout.as_millis() as u64,
                "heartbeat timed out; reconnecting"
            );
            self.restart().await;
        }
    }

    /// Replaces a dead connection right away.
    async fn restart(&mut self) {
        self.teardown(Closure::Intentional).await;
        self.start_connect(false);
    }

    fn schedule_reconnect(&mut self) {
        let max = self.config.max_reconnect_attempts;
        if max > 0 && self.reconnect_attempts >= max {
            if !self.exhausted {
                self.exhausted = true;
                self.publish();
                error!(target: LOG_TARGET, attempts = self.reconnect_attempts, "giving up on reconnecting");
                self.registry
                    .notify(&LifecycleEvent::Error(ChannelFailure::ReconnectExhausted {
                        attempts: self.reconnect_attempts,
                    }));
            }
            return;
        }

        let delay = backoff_delay(
            self.reconnect_attempts,
            self.config.reconnect_base,
            self.config.reconnect_cap,
        );
        self.timers.reconnect = Some(Instant::now() + delay);
        self.publish();
        info!(
            target: LOG_TARGET,
            attempt = self.reconnect_attempts + 1,
            delay_ms = delay.as_millis() as u64,
            "reconnect scheduled"
        );
    }

    async fn teardown(&mut self, closure: Closure) {
        if let Some(attempt) = self.attempt.take() {
            attempt.cancel.cancel();
        }

        let was_open = match self.conn.take() {
            Some(mut transport) => {
                if closure == Closure::Intentional {
                    let _ = tokio::time::timeout(CLOSE_TIMEOUT, transport.disconnect()).await;
                }
                true
            }
            None => false,
        };

        self.authenticated = false;
        self.auth_attempted = false;
        self.probe_answered = true;
        self.timers.clear_connection();
        let dropped = self.pending.clear();
        if dropped > 0 {
            debug!(target: LOG_TARGET, dropped, "discarded queued requests");
        }
        self.publish();

        if was_open {
            self.registry.notify(&LifecycleEvent::Disconnected);
        }
        if closure == Closure::Lost {
            self.schedule_reconnect();
        }
    }
}
