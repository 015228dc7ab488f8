//! STOMP 1.2 frame codec.
//!
//! Frames are text: a command line, `name:value` header lines, a blank
//! line, the body, and a NUL terminator. A transport message may carry
//! several frames, and bare end-of-line bytes between frames are
//! heart-beats.
//!
//! Header values are escaped (`\\`, `\n`, `\r`, `\c`) on every frame
//! except CONNECT and CONNECTED, which keep 1.0 compatibility.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Map, Value};

/// STOMP frame command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Client handshake.
    Connect,
    /// Client handshake (1.2 alias).
    Stomp,
    /// Server handshake reply.
    Connected,
    /// Publish a message.
    Send,
    /// Register a subscription.
    Subscribe,
    /// Drop a subscription.
    Unsubscribe,
    /// Acknowledge a message.
    Ack,
    /// Reject a message.
    Nack,
    /// Start a transaction.
    Begin,
    /// Commit a transaction.
    Commit,
    /// Roll back a transaction.
    Abort,
    /// Graceful client disconnect.
    Disconnect,
    /// Message delivered to a subscription.
    Message,
    /// Receipt for a client frame.
    Receipt,
    /// Server-side error.
    Error,
}

impl Command {
    /// Wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Stomp => "STOMP",
            Self::Connected => "CONNECTED",
            Self::Send => "SEND",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Ack => "ACK",
            Self::Nack => "NACK",
            Self::Begin => "BEGIN",
            Self::Commit => "COMMIT",
            Self::Abort => "ABORT",
            Self::Disconnect => "DISCONNECT",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
        }
    }

    /// Handshake frames carry unescaped headers.
    fn escapes_headers(self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "CONNECT" => Self::Connect,
            "STOMP" => Self::Stomp,
            "CONNECTED" => Self::Connected,
            "SEND" => Self::Send,
            "SUBSCRIBE" => Self::Subscribe,
            "UNSUBSCRIBE" => Self::Unsubscribe,
            "ACK" => Self::Ack,
            "NACK" => Self::Nack,
            "BEGIN" => Self::Begin,
            "COMMIT" => Self::Commit,
            "ABORT" => Self::Abort,
            "DISCONNECT" => Self::Disconnect,
            "MESSAGE" => Self::Message,
            "RECEIPT" => Self::Receipt,
            "ERROR" => Self::Error,
            other => return Err(FrameError::UnknownCommand(other.to_string())),
        })
    }
}

/// Frame decoding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// No command line.
    Empty,
    /// Command line is not a STOMP command.
    UnknownCommand(String),
    /// Header line without a colon.
    MalformedHeader(String),
    /// Header value with an undefined escape sequence.
    InvalidEscape(String),
    /// SockJS envelope could not be decoded.
    SockJs(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty frame"),
            Self::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            Self::MalformedHeader(line) => write!(f, "malformed header line: {line}"),
            Self::InvalidEscape(value) => write!(f, "invalid escape in header: {value}"),
            Self::SockJs(msg) => write!(f, "bad SockJS frame: {msg}"),
        }
    }
}

impl std::error::Error for FrameError {}

/// A single STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: Command,
    headers: Vec<(String, String)>,
    body: String,
}

impl Frame {
    /// Create a frame with no headers and an empty body.
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Frame command.
    #[must_use]
    pub fn command(&self) -> Command {
        self.command
    }

    /// Headers in wire order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of header `name` (repeated headers: first wins).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Frame body.
    #[must_use]
    pub fn body_str(&self) -> &str {
        &self.body
    }

    /// Encode to wire text, NUL terminator included.
    #[must_use]
    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        if !self.body.is_empty() && self.get("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Decode one frame (without its NUL terminator).
    ///
    /// Leading end-of-line bytes (heart-beats) are skipped.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let text = text.trim_start_matches(['\r', '\n']);
        let (head, body) = split_head(text);

        let mut lines = head.lines();
        let command_line = lines.next().map(str::trim_end).unwrap_or_default();
        if command_line.is_empty() {
            return Err(FrameError::Empty);
        }
        let command: Command = command_line.parse()?;
        let unescape = command.escapes_headers();

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
            if unescape {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let mut frame = Self {
            command,
            headers,
            body: String::new(),
        };
        frame.body = frame.declared_body(body).to_string();
        Ok(frame)
    }

    /// `body` cut to `content-length` when the header is present and fits.
    fn declared_body<'b>(&self, body: &'b str) -> &'b str {
        match self.get("content-length").and_then(|v| v.trim().parse::<usize>().ok()) {
            Some(len) if len <= body.len() && body.is_char_boundary(len) => &body[..len],
            _ => body,
        }
    }

    /// JSON view of the frame (used for error entries).
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut headers = Map::new();
        for (name, value) in &self.headers {
            headers
                .entry(name.clone())
                .or_insert_with(|| Value::String(value.clone()));
        }
        json!({
            "command": self.command.as_str(),
            "headers": headers,
            "body": self.body,
        })
    }
}

/// Debug-sink rendering: command, headers, blank line, body.
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.command)?;
        for (name, value) in &self.headers {
            writeln!(f, "{name}:{value}")?;
        }
        if self.body.is_empty() {
            Ok(())
        } else {
            write!(f, "\n{}", self.body)
        }
    }
}

/// One piece of a transport message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    /// End-of-line heart-beat.
    Heartbeat,
    /// Frame text, NUL stripped.
    Frame(&'a str),
}

/// Split a transport message into frames and heart-beats.
#[must_use]
pub fn split_frames(data: &str) -> Vec<Chunk<'_>> {
    let mut chunks = Vec::new();
    let mut pieces = data.split('\0').peekable();
    while let Some(piece) = pieces.next() {
        let is_last = pieces.peek().is_none();
        if piece.trim_matches(['\r', '\n']).is_empty() {
            // Trailing empty remainder after the last NUL is not a heart-beat.
            if !(is_last && piece.is_empty()) {
                chunks.push(Chunk::Heartbeat);
            }
        } else {
            chunks.push(Chunk::Frame(piece));
        }
    }
    chunks
}

/// Split frame text at the first blank line (LF or CRLF).
fn split_head(text: &str) -> (&str, &str) {
    let mut start = 0;
    while let Some(offset) = text[start..].find('\n') {
        let end = start + offset;
        if start > 0 && text[start..end].trim_end_matches('\r').is_empty() {
            return (&text[..start], &text[end + 1..]);
        }
        start = end + 1;
    }
    (text, "")
}

fn escape_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(value: &str) -> Result<String, FrameError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(FrameError::InvalidEscape(value.to_string())),
        }
    }
    Ok(out)
}
