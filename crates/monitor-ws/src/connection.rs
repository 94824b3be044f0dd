//! Observer connection.
//!
//! A single duplex WebSocket stream used in request-then-response fashion.
//! Every send and read holds the stream mutex for the duration of the call,
//! and both are bounded by the configured request timeout.

use crate::error::{WsError, WsResult};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex as TokioMutex;
use tokio::time::Instant;
use tokio_tungstenite::{
    connect_async_tls_with_config, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default observer endpoint.
pub const DEFAULT_OBSERVER_URL: &str = "wss://observer.terra.dev";

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Observer WebSocket URL.
    pub url: String,
    /// Deadline for each write and each read.
    pub request_timeout: Duration,
    /// Deadline for the opening handshake.
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OBSERVER_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(45),
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake done, stream usable.
    Connected,
    /// Peer closed or the stream ended; further reads fail.
    Disconnected,
    /// Closed locally via [`ObserverConnection::close`].
    Closed,
}

/// WebSocket connection to the block observer.
pub struct ObserverConnection {
    config: ConnectionConfig,
    /// `None` once closed locally.
    stream: TokioMutex<Option<WsStream>>,
    state: RwLock<ConnectionState>,
}

impl ObserverConnection {
    /// Open the connection.
    pub async fn connect(config: ConnectionConfig) -> WsResult<Self> {
        info!(url = %config.url, timeout = ?config.request_timeout, "Connecting to observer");

        let handshake = connect_async_tls_with_config(&config.url, None, true, None);
        let (stream, _response) = tokio::time::timeout(config.connect_timeout, handshake)
            .await
            .map_err(|_| WsError::Timeout {
                op: "connect",
                timeout: config.connect_timeout,
            })?
            .map_err(|e| WsError::ConnectionFailed(format!("{}: {e}", config.url)))?;

        info!(url = %config.url, "Observer connected");
        Ok(Self {
            config,
            stream: TokioMutex::new(Some(stream)),
            state: RwLock::new(ConnectionState::Connected),
        })
    }

    /// Get current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn request_timeout(&self) -> Duration {
        self.config.request_timeout
    }

    /// Send one text frame within the write deadline.
    pub async fn send_text(&self, text: &str) -> WsResult<()> {
        let timeout = self.config.request_timeout;
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or(WsError::Shutdown)?;

        match tokio::time::timeout(timeout, stream.send(Message::Text(text.to_string()))).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(WsError::SendFailed(e.to_string())),
            Err(_) => Err(WsError::Timeout { op: "write", timeout }),
        }
    }

    /// Read the next data frame (text or binary) within the read deadline.
    ///
    /// Control frames are skipped without extending the deadline.
    pub async fn read_payload(&self) -> WsResult<Vec<u8>> {
        let timeout = self.config.request_timeout;
        let deadline = Instant::now() + timeout;
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or(WsError::Shutdown)?;

        loop {
            let next = tokio::time::timeout_at(deadline, stream.next())
                .await
                .map_err(|_| WsError::Timeout { op: "read", timeout })?;

            match next {
                Some(Ok(Message::Text(text))) => return Ok(text.into_bytes()),
                Some(Ok(Message::Binary(data))) => return Ok(data),
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                    debug!("Skipping control frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (f.code.into(), f.reason.to_string()))
                        .unwrap_or((1000, "Normal close".to_string()));
                    warn!(code, %reason, "Observer closed the connection");
                    *self.state.write() = ConnectionState::Disconnected;
                    return Err(WsError::ConnectionClosed { code, reason });
                }
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => return Err(WsError::ReadFailed(e.to_string())),
                None => {
                    *self.state.write() = ConnectionState::Disconnected;
                    return Err(WsError::ConnectionClosed {
                        code: 1006,
                        reason: "Stream ended".to_string(),
                    });
                }
            }
        }
    }

    /// Send a Close frame and drop the stream.
    ///
    /// Best-effort: a failed Close frame is logged, never returned. Calling
    /// this more than once is a no-op.
    pub async fn close(&self) {
        let mut guard = self.stream.lock().await;
        let Some(mut stream) = guard.take() else {
            return;
        };
        *self.state.write() = ConnectionState::Closed;

        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, stream.send(Message::Close(None))).await {
            Ok(Ok(())) => debug!("Close frame sent"),
            Ok(Err(e)) => warn!(?e, "Failed to send Close frame"),
            Err(_) => warn!(?timeout, "Close frame timed out"),
        }
        drop(stream);
        info!(url = %self.config.url, "Closed observer connection");
    }
}

impl std::fmt::Debug for ObserverConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverConnection")
            .field("url", &self.config.url)
            .field("state", &self.state())
            .finish()
    }
}
