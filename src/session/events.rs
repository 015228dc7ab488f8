//! Events delivered from a client session to the manager.
//!
//! Every event travels inside an [`Envelope`] stamped with the id of the
//! session that produced it, so events from a session the manager already
//! released can be told apart from the live one.

/// Generation number of a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that happened on a client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Handshake completed.
    Connected,
    /// Diagnostic line from the client.
    Debug(String),
    /// A MESSAGE frame arrived on a subscription.
    MessageReceived {
        /// Destination the subscription was made for.
        destination: String,
        /// Raw frame body.
        body: String,
    },
    /// The server sent an ERROR frame.
    ErrorFrame {
        /// Pretty-printed JSON serialization of the frame.
        details: String,
    },
    /// The transport closed (by either side).
    Closed,
}

/// Session event stamped with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Session that produced the event.
    pub session: SessionId,
    /// The event itself.
    pub event: SessionEvent,
}
