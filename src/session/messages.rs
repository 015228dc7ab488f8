//! Append-only message log shown in the event panel.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// Kind label of a log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// New data notification.
    New,
    /// Update notification.
    Update,
    /// Client diagnostic line.
    Log,
    /// Error frame or undecodable payload.
    Error,
    /// Message received on a subscribed channel.
    Channel(String),
}

/// Display colour class of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Errors (red).
    Error,
    /// Diagnostics (grey).
    Log,
    /// Everything else.
    Normal,
}

impl EntryKind {
    /// Colour class for the kind.
    #[must_use]
    pub fn tone(&self) -> Tone {
        match self {
            Self::Error => Tone::Error,
            Self::Log => Tone::Log,
            Self::New | Self::Update | Self::Channel(_) => Tone::Normal,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => f.write_str("NEW"),
            Self::Update => f.write_str("UPDATE"),
            Self::Log => f.write_str("LOG"),
            Self::Error => f.write_str("ERROR"),
            Self::Channel(name) => write!(f, "channel:{name}"),
        }
    }
}

impl Serialize for EntryKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One immutable log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageEntry {
    kind: EntryKind,
    payload: Value,
}

impl MessageEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(kind: EntryKind, payload: Value) -> Self {
        Self { kind, payload }
    }

    /// Diagnostic text entry.
    #[must_use]
    pub fn log(line: impl Into<String>) -> Self {
        Self::new(EntryKind::Log, Value::String(line.into()))
    }

    /// Entry kind.
    #[must_use]
    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }

    /// Entry payload.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Payload as display text: strings verbatim, other values pretty JSON.
    #[must_use]
    pub fn payload_text(&self) -> String {
        match &self.payload {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }
}

/// Entries in arrival order.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<MessageEntry>,
}

impl MessageLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn push(&mut self, entry: MessageEntry) {
        self.entries.push(entry);
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    /// Entries from index `start` on (empty when out of range).
    #[must_use]
    pub fn since(&self, start: usize) -> &[MessageEntry] {
        self.entries.get(start..).unwrap_or_default()
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&MessageEntry> {
        self.entries.last()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
