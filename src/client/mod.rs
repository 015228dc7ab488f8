//! Messaging-client capability interface.
//!
//! The session manager never speaks STOMP itself. It activates a client
//! through [`Connector`], talks to the live client through a
//! [`SessionHandle`], and learns about everything that happens on the wire
//! from [`SessionEvent`]s pushed into an [`EventSink`].
//!
//! # Architecture
//!
//! ```text
//! SessionManager ──activate(ClientConfig, EventSink)──> Connector
//!       │                                                  │
//!       │<── mpsc (SessionId, SessionEvent) ── client task ┘
//!       │
//!       └──subscribe / deactivate──> SessionHandle
//! ```
//!
//! [`stomp::StompConnector`] is the real implementation; tests plug in a
//! fake connector.

#[cfg(test)]
pub mod fake;
pub mod frame;
pub mod sockjs;
pub mod stomp;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::session::{Envelope, SessionEvent, SessionId};
use crate::ws;

pub use frame::{Command, Frame, FrameError};
pub use stomp::{StompConnector, StompSession};

/// Everything a client needs to open a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Endpoint URL as typed by the user.
    pub url: String,
    /// Extra CONNECT headers (auth token when enabled).
    pub connect_headers: Vec<(String, String)>,
    /// Delay between connection attempts while still connecting.
    pub reconnect_delay: Duration,
    /// Heart-beat interval we can send (zero disables).
    pub heartbeat_outgoing: Duration,
    /// Heart-beat interval we want to receive (zero disables).
    pub heartbeat_incoming: Duration,
    /// Transport framing.
    pub transport: TransportKind,
}

/// Transport framing used underneath STOMP.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// SockJS for `http(s)://` URLs, raw WebSocket otherwise.
    #[default]
    Auto,
    /// SockJS websocket transport framing.
    Sockjs,
    /// STOMP frames directly over WebSocket.
    #[serde(rename = "websocket")]
    WebSocket,
}

impl TransportKind {
    /// Resolve `Auto` against the URL scheme.
    #[must_use]
    pub fn resolve(self, url: &str) -> Self {
        match self {
            Self::Auto if ws::is_http_url(url) => Self::Sockjs,
            Self::Auto => Self::WebSocket,
            other => other,
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Sockjs => write!(f, "sockjs"),
            Self::WebSocket => write!(f, "websocket"),
        }
    }
}

/// Connection state of the session as seen by the manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session.
    #[default]
    Disconnected,
    /// Session activated, waiting for CONNECTED.
    Connecting,
    /// CONNECTED received; subscriptions registered.
    Connected,
}

impl ConnectionState {
    /// Whether a connect action makes sense in this state.
    #[must_use]
    pub fn can_connect(self) -> bool {
        self == Self::Disconnected
    }

    /// Whether a disconnect action makes sense in this state.
    #[must_use]
    pub fn can_disconnect(self) -> bool {
        self != Self::Disconnected
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Sender side of the session event queue, stamped with one session id.
///
/// Cloneable so a client can hand it to helper tasks. Sends after the
/// manager is gone are silently dropped.
#[derive(Clone, Debug)]
pub struct EventSink {
    session: SessionId,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl EventSink {
    /// Create a sink that stamps every event with `session`.
    #[must_use]
    pub fn new(session: SessionId, tx: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { session, tx }
    }

    /// Session id this sink stamps.
    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Push an event into the queue.
    pub fn emit(&self, event: SessionEvent) {
        if self
            .tx
            .send(Envelope {
                session: self.session,
                event,
            })
            .is_err()
        {
            log::debug!("Session event queue closed; dropping event");
        }
    }

    /// Push a diagnostic line (the client's debug sink).
    pub fn debug(&self, line: impl Into<String>) {
        self.emit(SessionEvent::Debug(line.into()));
    }
}

/// Factory for live client sessions.
pub trait Connector {
    /// Handle type for sessions this connector creates.
    type Handle: SessionHandle;

    /// Start a client for `config`.
    ///
    /// Returns immediately; the outcome arrives later through `events`.
    fn activate(&self, config: ClientConfig, events: EventSink) -> Self::Handle;
}

/// Control surface of one live client session.
///
/// Dropping a handle deactivates the client as well.
pub trait SessionHandle {
    /// Subscribe to `destination`; messages arrive as
    /// [`SessionEvent::MessageReceived`].
    fn subscribe(&mut self, destination: &str);

    /// Ask the client to disconnect. Fire-and-forget.
    fn deactivate(self);
}

/// Errors raised inside the client while establishing or running a session.
#[derive(Debug)]
pub enum ClientError {
    /// Failed to establish the transport.
    ConnectionFailed(String),
    /// The server answered the handshake with an ERROR frame.
    Rejected(String),
    /// A handshake step timed out.
    Timeout,
    /// The transport closed during the handshake.
    Closed,
    /// Reading from or writing to an established transport failed.
    Transport(String),
    /// A frame could not be decoded.
    Frame(FrameError),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed(msg) => write!(f, "Connection failed: {msg}"),
            Self::Rejected(msg) => write!(f, "Connection rejected: {msg}"),
            Self::Timeout => write!(f, "Operation timed out"),
            Self::Closed => write!(f, "Connection closed"),
            Self::Transport(msg) => write!(f, "Transport error: {msg}"),
            Self::Frame(e) => write!(f, "Frame error: {e}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Frame(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FrameError> for ClientError {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}
