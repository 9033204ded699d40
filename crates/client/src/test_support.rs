// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted transport and API doubles shared by the channel and store tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fm_core::{message_type, Envelope};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::api::{ApiError, ApiRequest, FallbackApi};
use crate::channel::{
    ChannelClient, ChannelConfig, Connector, Transport, TransportError, TransportFuture,
};
use crate::credentials::{CredentialStore, MemoryCredentials};
use crate::store::{MailboxStore, StoreConfig};

/// Computes the server's replies to one client frame.
pub type Responder = Arc<dyn Fn(&Envelope) -> Vec<Envelope> + Send + Sync>;

/// Inbound frames, or a receive error to surface from `recv`.
type Frame = Result<Envelope, String>;

type Inbox = Arc<Mutex<Option<mpsc::UnboundedSender<Frame>>>>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum ConnectMode {
    Accept,
    Refuse,
    Hang,
}

/// Test-side view of one accepted connection.
#[derive(Clone)]
pub struct MockServer {
    inbox: Inbox,
    sent: Arc<Mutex<Vec<Envelope>>>,
    fail_sends: Arc<AtomicBool>,
    closed_by_client: Arc<AtomicBool>,
}

impl MockServer {
    /// Pushes a frame to the client.
    pub fn push(&self, msg: Envelope) {
        if let Some(tx) = self.inbox.lock().unwrap().as_ref() {
            let _ = tx.send(Ok(msg));
        }
    }

    /// Makes the client's next receive fail with `reason`.
    pub fn fail_recv(&self, reason: &str) {
        if let Some(tx) = self.inbox.lock().unwrap().as_ref() {
            let _ = tx.send(Err(reason.to_string()));
        }
    }

    /// Frames the client sent, in order.
    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().unwrap().clone()
    }

    /// Types of the frames the client sent, in order.
    pub fn sent_types(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.kind).collect()
    }

    /// Sent frames other than authentication and heartbeats.
    pub fn requests(&self) -> Vec<Envelope> {
        self.sent()
            .into_iter()
            .filter(|m| !m.is(message_type::AUTHENTICATE) && !m.is(message_type::HEARTBEAT))
            .collect()
    }

    pub fn count_sent(&self, kind: &str) -> usize {
        self.sent().iter().filter(|m| m.is(kind)).count()
    }

    /// Makes every following send fail.
    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    /// Closes the connection from the server side.
    pub fn close(&self) {
        self.inbox.lock().unwrap().take();
    }

    pub fn closed_by_client(&self) -> bool {
        self.closed_by_client.load(Ordering::SeqCst)
    }
}

pub struct MockTransport {
    mode: ConnectMode,
    connected: bool,
    inbox: Inbox,
    incoming: mpsc::UnboundedReceiver<Frame>,
    server: MockServer,
    responder: Option<Responder>,
}

impl MockTransport {
    fn new(mode: ConnectMode, responder: Option<Responder>) -> (Self, MockServer) {
        let (tx, rx) = mpsc::unbounded_channel();
        let inbox: Inbox = Arc::new(Mutex::new(Some(tx)));
        let server = MockServer {
            inbox: Arc::clone(&inbox),
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_sends: Arc::new(AtomicBool::new(false)),
            closed_by_client: Arc::new(AtomicBool::new(false)),
        };
        let transport = MockTransport {
            mode,
            connected: false,
            inbox,
            incoming: rx,
            server: server.clone(),
            responder,
        };
        (transport, server)
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, _url: &str) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            match self.mode {
                ConnectMode::Accept => {
                    self.connected = true;
                    Ok(())
                }
                ConnectMode::Refuse => Err(TransportError::ConnectionFailed("refused".into())),
                ConnectMode::Hang => std::future::pending().await,
            }
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.connected = false;
            self.server.closed_by_client.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn send(&mut self, msg: Envelope) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if !self.connected || self.server.fail_sends.load(Ordering::SeqCst) {
                return Err(TransportError::SendFailed("mock send failure".into()));
            }
            self.server.sent.lock().unwrap().push(msg.clone());
            if let Some(responder) = &self.responder {
                let replies = responder(&msg);
                if let Some(tx) = self.inbox.lock().unwrap().as_ref() {
                    for reply in replies {
                        let _ = tx.send(Ok(reply));
                    }
                }
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<Envelope>> {
        Box::pin(async move {
            match self.incoming.recv().await {
                Some(Ok(msg)) => Ok(Some(msg)),
                Some(Err(reason)) => Err(TransportError::ReceiveFailed(reason)),
                None => Ok(None),
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Connector that hands out scripted transports in order.
///
/// Once the script runs out every attempt is refused.
#[derive(Clone, Default)]
pub struct MockConnector {
    script: Arc<Mutex<VecDeque<MockTransport>>>,
    attempts: Arc<Mutex<usize>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, mode: ConnectMode, responder: Option<Responder>) -> MockServer {
        let (transport, server) = MockTransport::new(mode, responder);
        self.script.lock().unwrap().push_back(transport);
        server
    }

    /// Next attempt opens; the server stays silent unless driven by the test.
    pub fn accept(&self) -> MockServer {
        self.push(ConnectMode::Accept, None)
    }

    /// Next attempt opens and the server answers through `responder`.
    pub fn accept_with(
        &self,
        responder: impl Fn(&Envelope) -> Vec<Envelope> + Send + Sync + 'static,
    ) -> MockServer {
        self.push(ConnectMode::Accept, Some(Arc::new(responder)))
    }

    /// Next attempt opens; the server accepts every token and answers heartbeats.
    pub fn accept_authenticating(&self) -> MockServer {
        self.accept_with(auth_and_heartbeat)
    }

    /// Next attempt never completes.
    pub fn hang(&self) {
        self.push(ConnectMode::Hang, None);
    }

    /// Connection attempts made so far.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

impl Connector for MockConnector {
    fn create(&self) -> Box<dyn Transport> {
        *self.attempts.lock().unwrap() += 1;
        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(transport) => Box::new(transport),
            None => Box::new(MockTransport::new(ConnectMode::Refuse, None).0),
        }
    }
}

pub fn auth_ok() -> Envelope {
    Envelope::with_payload(message_type::AUTH_RESULT, json!({ "success": true }))
}

/// Replies only to authentication.
pub fn auth_only(msg: &Envelope) -> Vec<Envelope> {
    if msg.is(message_type::AUTHENTICATE) {
        vec![auth_ok()]
    } else {
        Vec::new()
    }
}

/// Replies to authentication and heartbeats.
pub fn auth_and_heartbeat(msg: &Envelope) -> Vec<Envelope> {
    if msg.is(message_type::HEARTBEAT) {
        vec![Envelope::new(message_type::HEARTBEAT_RESPONSE)]
    } else {
        auth_only(msg)
    }
}

/// Server that answers list and record requests from fixed data.
pub fn mailbox_server(
    emails: Value,
    records: Value,
) -> impl Fn(&Envelope) -> Vec<Envelope> + Send + Sync + 'static {
    move |msg: &Envelope| {
        if msg.is(message_type::GET_ALL_EMAILS) {
            vec![Envelope::with_payload(
                message_type::EMAILS_LIST,
                json!({ "data": emails }),
            )]
        } else if msg.is(message_type::GET_MAIL_RECORDS) {
            let email_id = msg.id_field("email_id").unwrap_or_default();
            vec![Envelope::with_payload(
                message_type::MAIL_RECORDS,
                json!({ "email_id": email_id, "data": records }),
            )]
        } else {
            auth_and_heartbeat(msg)
        }
    }
}

/// Channel settings with the production timings and a recognizable URL.
pub fn test_channel_config() -> ChannelConfig {
    ChannelConfig {
        url: "ws://mock".to_string(),
        ..ChannelConfig::default()
    }
}

/// Spawns a channel over `connector` with a token in memory.
pub fn spawn_channel(connector: &MockConnector) -> (ChannelClient, Arc<MemoryCredentials>) {
    let credentials = Arc::new(MemoryCredentials::with_token("test-token"));
    let channel = ChannelClient::spawn(
        test_channel_config(),
        Arc::new(connector.clone()),
        Arc::clone(&credentials) as Arc<dyn CredentialStore>,
    );
    (channel, credentials)
}

/// Spawns a store over a mock channel and `api`, with the default timings.
pub fn spawn_store(connector: &MockConnector, api: &MockApi) -> MailboxStore {
    let (channel, _credentials) = spawn_channel(connector);
    MailboxStore::new(channel, Arc::new(api.clone()), StoreConfig::default())
}

/// Lets the paused clock run forward so spawned tasks and timers progress.
pub async fn settle(duration: Duration) {
    tokio::time::sleep(duration).await;
}

/// Fallback API double: answers from a per-path script and records calls.
#[derive(Clone, Default)]
pub struct MockApi {
    responses: Arc<Mutex<Vec<(String, VecDeque<Result<Value, ApiError>>)>>>,
    calls: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for requests to `path` ("METHOD /path").
    pub fn respond(&self, route: &str, response: Result<Value, ApiError>) {
        let mut responses = self.responses.lock().unwrap();
        match responses.iter_mut().find(|(r, _)| r == route) {
            Some((_, queue)) => queue.push_back(response),
            None => responses.push((route.to_string(), VecDeque::from([response]))),
        }
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls as "METHOD /path" strings.
    pub fn routes(&self) -> Vec<String> {
        self.calls().iter().map(ApiRequest::route).collect()
    }
}

impl FallbackApi for MockApi {
    fn call(
        &self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ApiError>> + Send + '_>> {
        Box::pin(async move {
            let route = request.route();
            self.calls.lock().unwrap().push(request);
            let mut responses = self.responses.lock().unwrap();
            responses
                .iter_mut()
                .find(|(r, _)| *r == route)
                .and_then(|(_, queue)| queue.pop_front())
                .unwrap_or_else(|| Err(ApiError::Network(format!("no scripted response for {route}"))))
        })
    }
}
