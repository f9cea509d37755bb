//! Transport session: the single control connection to the host.
//!
//! State machine:
//! - `Disconnected` → `Connected` on a successful connect inside `acquire()`
//! - `Connected` → `Disconnected` when an exchange fails (reset, broken pipe,
//!   timeout, malformed frame) or the liveness probe finds the peer gone
//!
//! All transitions happen under one async mutex. A `SessionGuard` holds that
//! mutex for the duration of an exchange, so at most one command is ever in
//! flight per session.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{FutureExt, SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::codec::Framed;

use super::codec::JsonCodec;
use super::protocol::CommandEnvelope;
use crate::config::SessionConfig;

/// Byte stream the session can run over.
pub trait HostStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> HostStream for T {}

/// Establishes the underlying stream to the host.
///
/// Production uses `TcpConnector`; tests plug in in-memory pipes.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> io::Result<Box<dyn HostStream>>;

    /// Human-readable peer description for logs.
    fn peer(&self) -> String;
}

pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> io::Result<Box<dyn HostStream>> {
        let stream = TcpStream::connect(&self.addr).await?;
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }

    fn peer(&self) -> String {
        self.addr.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connect to {peer} failed: {source}")]
    Connect { peer: String, source: io::Error },

    #[error("connect to {peer} timed out after {timeout:?}")]
    ConnectTimeout { peer: String, timeout: Duration },

    #[error("{phase} timed out after {timeout:?}")]
    Timeout {
        phase: &'static str,
        timeout: Duration,
    },

    #[error("connection closed by host")]
    Closed,

    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    #[error("session is not connected")]
    NotConnected,
}

type FramedHost = Framed<Box<dyn HostStream>, JsonCodec<Value>>;

enum SessionState {
    Disconnected,
    Connected(FramedHost),
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected(_) => "connected",
        }
    }
}

/// Process-scoped owner of the host connection.
///
/// Lazily connects on first `acquire()`, reconnects on the next `acquire()`
/// after a failure. Never retries on its own.
pub struct Session {
    connector: Arc<dyn Connector>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    connects: AtomicU64,
}

impl Session {
    pub fn new(connector: Arc<dyn Connector>, config: SessionConfig) -> Self {
        Self {
            connector,
            config,
            state: Mutex::new(SessionState::Disconnected),
            connects: AtomicU64::new(0),
        }
    }

    pub fn tcp(config: SessionConfig) -> Self {
        let connector = Arc::new(TcpConnector::new(config.addr()));
        Self::new(connector, config)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of successful connects over the session's lifetime.
    pub fn connect_count(&self) -> u64 {
        self.connects.load(Ordering::SeqCst)
    }

    pub async fn is_connected(&self) -> bool {
        matches!(*self.state.lock().await, SessionState::Connected(_))
    }

    /// Get exclusive use of a live connection, connecting if needed.
    ///
    /// Returns `None` (after logging once) when no connection can be made.
    /// Waits for any in-flight exchange to finish first.
    pub async fn acquire(&self) -> Option<SessionGuard<'_>> {
        let mut state = self.state.lock().await;

        if let SessionState::Connected(framed) = &mut *state
            && !probe_alive(framed)
        {
            tracing::info!(peer = %self.connector.peer(), "Host connection went stale, reconnecting");
            *state = SessionState::Disconnected;
        }

        if let SessionState::Disconnected = *state {
            match self.connect().await {
                Ok(framed) => {
                    *state = SessionState::Connected(framed);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to connect to host");
                    return None;
                }
            }
        }

        Some(SessionGuard {
            state,
            io_timeout: self.config.io_timeout,
        })
    }

    /// Drop the current connection, if any. The next `acquire()` reconnects.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        if matches!(*state, SessionState::Connected(_)) {
            tracing::info!(peer = %self.connector.peer(), "Host connection invalidated");
        }
        *state = SessionState::Disconnected;
    }

    async fn connect(&self) -> Result<FramedHost, SessionError> {
        let peer = self.connector.peer();
        let timeout = self.config.connect_timeout;

        let stream = match tokio::time::timeout(timeout, self.connector.connect()).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(SessionError::Connect { peer, source }),
            Err(_) => return Err(SessionError::ConnectTimeout { peer, timeout }),
        };

        let total = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(peer = %peer, connects = total, "Connected to host");

        Ok(Framed::new(
            stream,
            JsonCodec::with_max_frame_length(self.config.max_frame_length),
        ))
    }
}

/// Non-blocking check that a pooled connection is still usable.
///
/// Best effort: a peer that closed cleanly shows up as end-of-stream, an
/// unexpected frame means we no longer know where the stream stands.
fn probe_alive(framed: &mut FramedHost) -> bool {
    match framed.next().now_or_never() {
        None => true,
        Some(None) => false,
        Some(Some(Err(e))) => {
            tracing::debug!(error = %e, "Liveness probe saw transport error");
            false
        }
        Some(Some(Ok(unsolicited))) => {
            tracing::warn!(frame = %unsolicited, "Discarding unsolicited frame from host");
            false
        }
    }
}

/// Exclusive handle on a connected session.
///
/// Holding the guard blocks every other `acquire()` on the same session.
pub struct SessionGuard<'a> {
    state: MutexGuard<'a, SessionState>,
    io_timeout: Duration,
}

impl SessionGuard<'_> {
    /// Send one command and read exactly one reply frame.
    ///
    /// The connection is taken out of the session for the whole exchange and
    /// only put back once a complete reply has been read. A failure, or a
    /// caller dropping this future mid-exchange, leaves the session
    /// disconnected, so a late reply can never be read by the next command.
    pub async fn exchange(&mut self, envelope: &CommandEnvelope) -> Option<Value> {
        let SessionState::Connected(mut framed) =
            std::mem::replace(&mut *self.state, SessionState::Disconnected)
        else {
            tracing::warn!(command = %envelope.name, error = %SessionError::NotConnected, "Exchange skipped");
            return None;
        };

        match try_exchange(&mut framed, envelope, self.io_timeout).await {
            Ok(reply) => {
                *self.state = SessionState::Connected(framed);
                Some(reply)
            }
            Err(e) => {
                tracing::warn!(
                    command = %envelope.name,
                    error = %e,
                    "Exchange with host failed, dropping connection"
                );
                None
            }
        }
    }

    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }
}

async fn try_exchange(
    framed: &mut FramedHost,
    envelope: &CommandEnvelope,
    io_timeout: Duration,
) -> Result<Value, SessionError> {
    tracing::debug!(
        command = %envelope.name,
        payload_bytes = encoded_len(envelope),
        "Sending command to host"
    );
    tokio::time::timeout(io_timeout, framed.send(envelope))
        .await
        .map_err(|_| SessionError::Timeout {
            phase: "send",
            timeout: io_timeout,
        })??;

    let reply = match tokio::time::timeout(io_timeout, framed.next()).await {
        Err(_) => {
            return Err(SessionError::Timeout {
                phase: "receive",
                timeout: io_timeout,
            });
        }
        Ok(None) => return Err(SessionError::Closed),
        Ok(Some(Err(e))) => return Err(SessionError::Io(e)),
        Ok(Some(Ok(reply))) => reply,
    };

    tracing::debug!(
        command = %envelope.name,
        payload_bytes = encoded_len(&reply),
        "Received reply from host"
    );
    Ok(reply)
}

/// JSON byte length of a frame body, computed only when debug logging is on.
fn encoded_len<T: Serialize>(value: &T) -> usize {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return 0;
    }
    serde_json::to_vec(value).map_or(0, |bytes| bytes.len())
}
