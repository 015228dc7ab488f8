//! SockJS websocket-transport framing.
//!
//! A SockJS endpoint such as `http://host/ws` is reached over a raw
//! WebSocket at `ws://host/ws/<server>/<session>/websocket`. Every text
//! message from the server starts with a one-letter type:
//!
//! | Prefix | Meaning |
//! |--------|---------|
//! | `o` | session opened |
//! | `h` | heart-beat |
//! | `a` | JSON array of messages |
//! | `m` | single JSON-encoded message |
//! | `c` | `[code, "reason"]` close |
//!
//! Outgoing messages are sent as a JSON array of strings.

use rand::distr::Alphanumeric;
use rand::Rng;

use super::frame::FrameError;
use crate::ws;

/// Length of the random session path segment.
const SESSION_ID_LEN: usize = 8;

/// One decoded SockJS server frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SockJsFrame {
    /// Session opened.
    Open,
    /// Server heart-beat.
    Heartbeat,
    /// Application messages (STOMP text).
    Messages(Vec<String>),
    /// Server closed the session.
    Close {
        /// SockJS close code (e.g. 3000 "Go away!").
        code: u16,
        /// Close reason.
        reason: String,
    },
}

/// Build the raw-websocket URL for a SockJS base URL.
#[must_use]
pub fn websocket_url(base: &str) -> String {
    let mut rng = rand::rng();
    let server: u16 = rng.random_range(0..1000);
    let session: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    websocket_url_with(base, server, &session)
}

/// Deterministic variant of [`websocket_url`].
#[must_use]
pub fn websocket_url_with(base: &str, server: u16, session: &str) -> String {
    let (path, query) = match base.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (base, None),
    };
    let mut url = format!(
        "{}/{:03}/{}/websocket",
        ws::http_to_ws_scheme(path.trim_end_matches('/')),
        server % 1000,
        session
    );
    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Decode one server text message.
pub fn decode(text: &str) -> Result<SockJsFrame, FrameError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or_else(|| FrameError::SockJs("empty message".into()))?;
    let rest = chars.as_str();
    let bad = |e: serde_json::Error| FrameError::SockJs(format!("{kind}: {e}"));

    match kind {
        'o' => Ok(SockJsFrame::Open),
        'h' => Ok(SockJsFrame::Heartbeat),
        'a' => serde_json::from_str::<Vec<String>>(rest)
            .map(SockJsFrame::Messages)
            .map_err(bad),
        'm' => serde_json::from_str::<String>(rest)
            .map(|m| SockJsFrame::Messages(vec![m]))
            .map_err(bad),
        'c' => serde_json::from_str::<(u16, String)>(rest)
            .map(|(code, reason)| SockJsFrame::Close { code, reason })
            .map_err(bad),
        other => Err(FrameError::SockJs(format!("unknown frame type '{other}'"))),
    }
}

/// Encode one outgoing message.
#[must_use]
pub fn encode(message: &str) -> String {
    // A one-element array of strings always serializes.
    serde_json::to_string(&[message]).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url_with() {
        assert_eq!(
            websocket_url_with("http://localhost:8080/ws", 7, "abcd1234"),
            "ws://localhost:8080/ws/007/abcd1234/websocket"
        );
        assert_eq!(
            websocket_url_with("https://example.com/ws/", 123, "zz"),
            "wss://example.com/ws/123/zz/websocket"
        );
    }

    #[test]
    fn test_websocket_url_keeps_query() {
        assert_eq!(
            websocket_url_with("http://h/ws?token=abc", 1, "s"),
            "ws://h/ws/001/s/websocket?token=abc"
        );
    }

    #[test]
    fn test_websocket_url_random_shape() {
        let url = websocket_url("http://h/ws");
        let parts: Vec<&str> = url.trim_start_matches("ws://h/ws/").split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 3);
        assert_eq!(parts[1].len(), SESSION_ID_LEN);
        assert_eq!(parts[2], "websocket");
    }

    #[test]
    fn test_decode_control_frames() {
        assert_eq!(decode("o"), Ok(SockJsFrame::Open));
        assert_eq!(decode("h"), Ok(SockJsFrame::Heartbeat));
        assert_eq!(
            decode("c[3000,\"Go away!\"]"),
            Ok(SockJsFrame::Close {
                code: 3000,
                reason: "Go away!".to_string()
            })
        );
    }

    #[test]
    fn test_decode_messages() {
        assert_eq!(
            decode("a[\"CONNECTED\\nversion:1.2\\n\\n\\u0000\",\"\\n\"]"),
            Ok(SockJsFrame::Messages(vec![
                "CONNECTED\nversion:1.2\n\n\0".to_string(),
                "\n".to_string()
            ]))
        );
        assert_eq!(
            decode("m\"hello\""),
            Ok(SockJsFrame::Messages(vec!["hello".to_string()]))
        );
    }

    #[test]
    fn test_decode_errors() {
        assert!(decode("").is_err());
        assert!(decode("x").is_err());
        assert!(decode("a[1,2]").is_err());
        assert!(decode("c[]").is_err());
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("SEND\n\n\0"), "[\"SEND\\n\\n\\u0000\"]");
    }
}
