// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for WebSocket communication.
//!
//! Provides a trait-based transport layer that enables:
//! - Real WebSocket connections for production
//! - Scripted transports for unit testing
//!
//! A `Connector` hands out a fresh, unconnected transport for every
//! connection attempt; the channel never reuses a transport after it closed.

use std::future::Future;
use std::pin::Pin;

use fm_core::Envelope;
use futures_util::stream::{SplitSink, SplitStream};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// A frame could not be encoded or decoded.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl TransportError {
    /// Returns true if the connection can keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TransportError::SerializationError(_))
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by transport methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// Transport trait for WebSocket-like communication.
pub trait Transport: Send + Sync {
    /// Connect to a remote server.
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()>;

    /// Close the connection with a normal-closure code.
    fn disconnect(&mut self) -> TransportFuture<'_, ()>;

    /// Send a frame to the server.
    fn send(&mut self, msg: Envelope) -> TransportFuture<'_, ()>;

    /// Receive a frame from the server.
    ///
    /// Returns `None` if the connection is closed.
    fn recv(&mut self) -> TransportFuture<'_, Option<Envelope>>;

    /// Check if connected.
    fn is_connected(&self) -> bool;
}

/// Creates unconnected transports, one per connection attempt.
pub trait Connector: Send + Sync + 'static {
    fn create(&self) -> Box<dyn Transport>;
}

/// Connector for real WebSocket transports.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    fn create(&self) -> Box<dyn Transport> {
        Box::new(WebSocketTransport::new())
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket transport implementation using tokio-tungstenite.
pub struct WebSocketTransport {
    ws: Option<WebSocketConnection>,
}

struct WebSocketConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl WebSocketTransport {
    /// Create a new, unconnected WebSocket transport.
    pub fn new() -> Self {
        WebSocketTransport { ws: None }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, url: &str) -> TransportFuture<'_, ()> {
        let url = url.to_string();
        Box::pin(async move {
            use futures_util::StreamExt;

            let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

            let (sink, stream) = ws_stream.split();
            self.ws = Some(WebSocketConnection { sink, stream });
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            use futures_util::SinkExt;

            if let Some(mut ws) = self.ws.take() {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: String::from("normal close").into(),
                };
                // The peer may already be gone; closing is best effort.
                let _ = ws.sink.send(Message::Close(Some(frame))).await;
                let _ = ws.sink.close().await;
            }
            Ok(())
        })
    }

    fn send(&mut self, msg: Envelope) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            use futures_util::SinkExt;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            let json = msg
                .to_json()
                .map_err(|e| TransportError::SerializationError(e.to_string()))?;

            if let Err(e) = ws.sink.send(Message::Text(json.into())).await {
                self.ws = None;
                return Err(TransportError::SendFailed(e.to_string()));
            }

            // Flushing surfaces a broken connection now rather than on the next send
            if let Err(e) = ws.sink.flush().await {
                self.ws = None;
                return Err(TransportError::SendFailed(e.to_string()));
            }

            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<Envelope>> {
        Box::pin(async move {
            use futures_util::StreamExt;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            loop {
                match ws.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let msg = Envelope::from_json(&text)
                            .map_err(|e| TransportError::SerializationError(e.to_string()))?;
                        return Ok(Some(msg));
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        self.ws = None;
                        return Ok(None);
                    }
                    // Ping/pong is answered by tungstenite; binary frames are not part of the protocol
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        self.ws = None;
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}
