//! Connection session manager.
//!
//! Owns the tester's state: connection settings, the subscription set, at
//! most one live client session, the message log and the unread counter.
//! UI actions call the methods below; client activity arrives as
//! [`Envelope`]s on an internal queue that the UI loop drains with
//! [`SessionManager::drain_events`].
//!
//! # Session lifecycle
//!
//! ```text
//! Disconnected ──connect()──> Connecting ──Connected──> Connected
//!      ^                          │                         │
//!      └──── disconnect() / Closed from the live session ───┘
//! ```
//!
//! Events carry the id of the session that produced them. After a session
//! is released its diagnostic lines, error frames and close notice still
//! land in the log, but it can no longer change the connection state or
//! deliver channel messages.
//!
//! The channels subscribed on CONNECTED are the ones in the set when
//! `connect()` was called; channels added later wait for the next connect.

mod events;
mod messages;
mod subscriptions;

pub use events::{Envelope, SessionEvent, SessionId};
pub use messages::{EntryKind, MessageEntry, MessageLog, Tone};
pub use subscriptions::SubscriptionSet;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::client::{
    ClientConfig, ConnectionState, Connector, EventSink, SessionHandle, TransportKind,
};
use crate::config::Config;
use crate::constants::{RECONNECT_DELAY, UNREAD_COUNT_FIELD};

/// Log line appended whenever a transport closes.
pub const CLOSED_NOTICE: &str = "WebSocket closed";

/// Connection settings edited through the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Endpoint URL.
    pub url: String,
    /// Send the token as a CONNECT header.
    pub use_auth: bool,
    /// Auth token.
    pub token: String,
    /// Header name carrying the token.
    pub auth_header: String,
    /// Heart-beat interval offered both ways, in milliseconds.
    pub heartbeat_ms: u64,
    /// Transport framing.
    pub transport: TransportKind,
}

impl ConnectionSettings {
    /// Settings taken from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            url: config.url.clone(),
            use_auth: config.use_auth,
            token: config.token.clone(),
            auth_header: config.auth_header.clone(),
            heartbeat_ms: config.heartbeat_ms,
            transport: config.transport,
        }
    }

    /// CONNECT headers: the auth header when enabled, nothing otherwise.
    #[must_use]
    pub fn connect_headers(&self) -> Vec<(String, String)> {
        if self.use_auth {
            vec![(self.auth_header.clone(), self.token.clone())]
        } else {
            Vec::new()
        }
    }

    /// Client configuration for a new session.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let heartbeat = std::time::Duration::from_millis(self.heartbeat_ms);
        ClientConfig {
            url: self.url.trim().to_string(),
            connect_headers: self.connect_headers(),
            reconnect_delay: RECONNECT_DELAY,
            heartbeat_outgoing: heartbeat,
            heartbeat_incoming: heartbeat,
            transport: self.transport,
        }
    }
}

/// The live session: its id, the client handle and the channels to
/// subscribe once connected.
#[derive(Debug)]
struct ActiveSession<H> {
    id: SessionId,
    handle: H,
    channels: Vec<String>,
}

/// Connection session manager.
pub struct SessionManager<C: Connector> {
    connector: C,
    settings: ConnectionSettings,
    subscriptions: SubscriptionSet,
    session: Option<ActiveSession<C::Handle>>,
    state: ConnectionState,
    log: MessageLog,
    unread: u64,
    next_session: u64,
    events_tx: mpsc::UnboundedSender<Envelope>,
    events_rx: mpsc::UnboundedReceiver<Envelope>,
}

impl<C: Connector> std::fmt::Debug for SessionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("settings", &self.settings)
            .field("subscriptions", &self.subscriptions)
            .field("session", &self.session_id())
            .field("state", &self.state)
            .field("log_len", &self.log.len())
            .field("unread", &self.unread)
            .finish_non_exhaustive()
    }
}

impl<C: Connector> SessionManager<C> {
    /// Create a manager with no session and an empty log.
    pub fn new(connector: C, settings: ConnectionSettings, subscriptions: SubscriptionSet) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            connector,
            settings,
            subscriptions,
            session: None,
            state: ConnectionState::Disconnected,
            log: MessageLog::new(),
            unread: 0,
            next_session: 1,
            events_tx,
            events_rx,
        }
    }

    /// Start a session unless one already exists.
    ///
    /// Returns `false` (and does nothing) when a session is active.
    pub fn connect(&mut self) -> bool {
        if let Some(active) = &self.session {
            log::debug!("connect ignored: session {} already active", active.id);
            return false;
        }

        let id = SessionId(self.next_session);
        self.next_session += 1;

        let config = self.settings.client_config();
        log::info!(
            "Activating session {} to {} ({} subscriptions, auth: {})",
            id,
            config.url,
            self.subscriptions.len(),
            self.settings.use_auth
        );

        let sink = EventSink::new(id, self.events_tx.clone());
        let handle = self.connector.activate(config, sink);
        self.session = Some(ActiveSession {
            id,
            handle,
            channels: self.subscriptions.as_slice().to_vec(),
        });
        self.state = ConnectionState::Connecting;
        true
    }

    /// Deactivate and release the current session.
    ///
    /// Returns `false` when there was none. The close handshake is not
    /// awaited.
    pub fn disconnect(&mut self) -> bool {
        let Some(active) = self.session.take() else {
            return false;
        };
        log::info!("Deactivating session {}", active.id);
        active.handle.deactivate();
        self.state = ConnectionState::Disconnected;
        true
    }

    /// Add a channel to the subscription set.
    ///
    /// Blank names and names already present are ignored. Channels added
    /// while a session is held are subscribed on the next connect.
    pub fn add_subscription(&mut self, name: &str) -> bool {
        self.subscriptions.insert(name)
    }

    /// Remove a channel from the subscription set.
    pub fn remove_subscription(&mut self, name: &str) -> bool {
        self.subscriptions.remove(name)
    }

    /// Empty the message log. Subscriptions and unread count stay.
    pub fn clear_messages(&mut self) {
        self.log.clear();
    }

    /// Apply up to `max` queued session events. Returns how many were applied.
    pub fn drain_events(&mut self, max: usize) -> usize {
        let mut applied = 0;
        while applied < max {
            let Ok(envelope) = self.events_rx.try_recv() else {
                break;
            };
            self.handle_event(envelope);
            applied += 1;
        }
        applied
    }

    /// Apply one session event.
    pub fn handle_event(&mut self, envelope: Envelope) {
        let Envelope { session, event } = envelope;
        let live = self.is_live(session);

        match event {
            SessionEvent::Debug(line) => {
                self.log.push(MessageEntry::log(line));
            }
            SessionEvent::Connected if live => {
                log::info!("Session {} connected", session);
                self.state = ConnectionState::Connected;
                if let Some(active) = self.session.as_mut() {
                    for channel in &active.channels {
                        active.handle.subscribe(channel);
                    }
                }
            }
            SessionEvent::MessageReceived { destination, body } if live => {
                self.record_message(destination, &body);
            }
            SessionEvent::ErrorFrame { details } => {
                log::warn!("STOMP error on session {}: {}", session, details);
                self.log.push(MessageEntry::new(EntryKind::Error, Value::String(details)));
            }
            SessionEvent::Closed => {
                self.log.push(MessageEntry::log(CLOSED_NOTICE));
                if live {
                    log::info!("Session {} closed", session);
                    self.session = None;
                    self.state = ConnectionState::Disconnected;
                }
            }
            stale => {
                log::debug!("Dropping {:?} from released session {}", stale, session);
            }
        }
    }

    fn record_message(&mut self, destination: String, body: &str) {
        match serde_json::from_str::<Value>(body) {
            Ok(payload) => {
                if let Some(count) = payload.get(UNREAD_COUNT_FIELD).and_then(Value::as_u64) {
                    self.unread = count;
                }
                self.log
                    .push(MessageEntry::new(EntryKind::Channel(destination), payload));
            }
            Err(e) => {
                log::warn!("Undecodable payload on {}: {}", destination, e);
                self.log.push(MessageEntry::new(
                    EntryKind::Error,
                    json!({
                        "destination": destination,
                        "error": e.to_string(),
                        "body": body,
                    }),
                ));
            }
        }
    }

    fn is_live(&self, session: SessionId) -> bool {
        self.session.as_ref().is_some_and(|a| a.id == session)
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a session is held.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Id of the held session.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|a| a.id)
    }

    /// Subscription set.
    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionSet {
        &self.subscriptions
    }

    /// Message log.
    #[must_use]
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Last unread count seen in a payload.
    #[must_use]
    pub fn unread(&self) -> u64 {
        self.unread
    }

    /// Connection settings.
    #[must_use]
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Mutable connection settings (used on the next connect).
    pub fn settings_mut(&mut self) -> &mut ConnectionSettings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeConnector;

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            url: "ws://localhost:61614/stomp".to_string(),
            use_auth: false,
            token: "tok".to_string(),
            auth_header: "x-auth-token".to_string(),
            heartbeat_ms: 10_000,
            transport: TransportKind::Auto,
        }
    }

    fn manager(channels: &[&str]) -> (SessionManager<FakeConnector>, FakeConnector) {
        let connector = FakeConnector::default();
        let manager = SessionManager::new(
            connector.clone(),
            settings(),
            channels.iter().copied().collect(),
        );
        (manager, connector)
    }

    /// Sink of the most recent activation.
    fn sink(connector: &FakeConnector) -> EventSink {
        connector.last_sink()
    }

    fn deliver(manager: &mut SessionManager<FakeConnector>, sink: &EventSink, event: SessionEvent) {
        sink.emit(event);
        manager.drain_events(usize::MAX);
    }

    fn message(destination: &str, body: &str) -> SessionEvent {
        SessionEvent::MessageReceived {
            destination: destination.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_add_existing_channel_is_noop() {
        let (mut manager, _) = manager(&["/queue/a"]);
        assert!(!manager.add_subscription("/queue/a"));
        assert_eq!(manager.subscriptions().as_slice(), ["/queue/a"]);
    }

    #[test]
    fn test_add_blank_channel_is_noop() {
        let (mut manager, _) = manager(&[]);
        assert!(!manager.add_subscription(""));
        assert!(!manager.add_subscription("  "));
        assert!(manager.subscriptions().is_empty());
    }

    #[test]
    fn test_remove_absent_channel_is_fine() {
        let (mut manager, _) = manager(&["/queue/a"]);
        assert!(!manager.remove_subscription("/queue/zzz"));
        assert!(manager.remove_subscription("/queue/a"));
        assert!(manager.subscriptions().is_empty());
    }

    #[test]
    fn test_connect_twice_creates_one_session() {
        let (mut manager, connector) = manager(&[]);
        assert!(manager.connect());
        assert!(!manager.connect());
        assert_eq!(connector.recorded.borrow().activations.len(), 1);
        assert_eq!(manager.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_disconnect_without_session_is_noop() {
        let (mut manager, connector) = manager(&[]);
        assert!(!manager.disconnect());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(connector.recorded.borrow().deactivated.is_empty());
    }

    #[test]
    fn test_disconnect_releases_immediately() {
        let (mut manager, connector) = manager(&[]);
        manager.connect();
        assert!(manager.disconnect());
        assert!(!manager.has_session());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert_eq!(connector.recorded.borrow().deactivated, vec![SessionId(1)]);

        // A fresh connect creates a new session.
        assert!(manager.connect());
        assert_eq!(manager.session_id(), Some(SessionId(2)));
    }

    #[test]
    fn test_connect_headers_follow_auth_toggle() {
        let (mut manager, connector) = manager(&[]);
        manager.connect();
        manager.disconnect();
        manager.settings_mut().use_auth = true;
        manager.connect();

        let recorded = connector.recorded.borrow();
        assert!(recorded.activations[0].0.connect_headers.is_empty());
        assert_eq!(
            recorded.activations[1].0.connect_headers,
            vec![("x-auth-token".to_string(), "tok".to_string())]
        );
        assert_eq!(recorded.activations[1].0.reconnect_delay.as_millis(), 5000);
    }

    #[test]
    fn test_channels_added_while_connecting_wait_for_next_connect() {
        let (mut manager, connector) = manager(&["/queue/a"]);
        manager.connect();
        assert!(manager.add_subscription("/topic/late"));
        let sink = sink(&connector);
        deliver(&mut manager, &sink, SessionEvent::Connected);

        assert_eq!(
            connector.recorded.borrow().subscribed,
            vec![(SessionId(1), "/queue/a".to_string())]
        );

        manager.disconnect();
        manager.connect();
        let sink = connector.last_sink();
        deliver(&mut manager, &sink, SessionEvent::Connected);
        let recorded = connector.recorded.borrow();
        assert_eq!(
            &recorded.subscribed[1..],
            [
                (SessionId(2), "/queue/a".to_string()),
                (SessionId(2), "/topic/late".to_string()),
            ]
        );
    }

    #[test]
    fn test_connected_subscribes_every_channel() {
        let (mut manager, connector) = manager(&["/queue/a", "/topic/b"]);
        manager.connect();
        let sink = sink(&connector);
        deliver(&mut manager, &sink, SessionEvent::Connected);

        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(
            connector.recorded.borrow().subscribed,
            vec![
                (SessionId(1), "/queue/a".to_string()),
                (SessionId(1), "/topic/b".to_string())
            ]
        );
    }

    #[test]
    fn test_subscription_added_after_connect_waits_for_next_connect() {
        let (mut manager, connector) = manager(&["/queue/a"]);
        manager.connect();
        let sink = sink(&connector);
        deliver(&mut manager, &sink, SessionEvent::Connected);
        manager.add_subscription("/queue/late");

        assert_eq!(connector.recorded.borrow().subscribed.len(), 1);

        manager.disconnect();
        manager.connect();
        let sink = connector.last_sink();
        deliver(&mut manager, &sink, SessionEvent::Connected);
        let recorded = connector.recorded.borrow();
        assert!(recorded
            .subscribed
            .contains(&(SessionId(2), "/queue/late".to_string())));
    }

    #[test]
    fn test_message_updates_log_and_unread() {
        let (mut manager, connector) = manager(&["/queue/a"]);
        manager.connect();
        let sink = sink(&connector);
        deliver(&mut manager, &sink, SessionEvent::Connected);
        deliver(&mut manager, &sink, message("/queue/a", r#"{"unreadCount": 3, "x": 1}"#));

        let last = manager.log().last().unwrap();
        assert_eq!(last.kind(), &EntryKind::Channel("/queue/a".to_string()));
        assert_eq!(last.payload(), &json!({"unreadCount": 3, "x": 1}));
        assert_eq!(manager.unread(), 3);

        deliver(&mut manager, &sink, message("/queue/a", r#"{"x": 2}"#));
        assert_eq!(manager.log().last().unwrap().payload(), &json!({"x": 2}));
        assert_eq!(manager.unread(), 3);
    }

    #[test]
    fn test_unread_is_overwritten_not_accumulated() {
        let (mut manager, connector) = manager(&["/q"]);
        manager.connect();
        let sink = sink(&connector);
        deliver(&mut manager, &sink, message("/q", r#"{"unreadCount": 5}"#));
        deliver(&mut manager, &sink, message("/q", r#"{"unreadCount": 2}"#));
        assert_eq!(manager.unread(), 2);
        deliver(&mut manager, &sink, message("/q", r#"{"unreadCount": 0}"#));
        assert_eq!(manager.unread(), 0);
    }

    #[test]
    fn test_malformed_payload_becomes_error_entry() {
        let (mut manager, connector) = manager(&["/q"]);
        manager.connect();
        let sink = sink(&connector);
        deliver(&mut manager, &sink, message("/q", r#"{"unreadCount": 4}"#));
        deliver(&mut manager, &sink, message("/q", "not json"));

        let last = manager.log().last().unwrap();
        assert_eq!(last.kind(), &EntryKind::Error);
        assert_eq!(last.payload()["destination"], "/q");
        assert_eq!(last.payload()["body"], "not json");
        assert_eq!(manager.unread(), 4);
    }

    #[test]
    fn test_clear_messages_keeps_unread_and_subscriptions() {
        let (mut manager, connector) = manager(&["/q"]);
        manager.connect();
        let sink = sink(&connector);
        deliver(&mut manager, &sink, message("/q", r#"{"unreadCount": 9}"#));
        manager.clear_messages();

        assert!(manager.log().is_empty());
        assert_eq!(manager.unread(), 9);
        assert_eq!(manager.subscriptions().as_slice(), ["/q"]);
    }

    #[test]
    fn test_debug_lines_become_log_entries() {
        let (mut manager, connector) = manager(&[]);
        manager.connect();
        let sink = sink(&connector);
        deliver(&mut manager, &sink, SessionEvent::Debug(">>> CONNECT".to_string()));

        let last = manager.log().last().unwrap();
        assert_eq!(last.kind(), &EntryKind::Log);
        assert_eq!(last.payload(), &json!(">>> CONNECT"));
    }

    #[test]
    fn test_error_frame_keeps_session() {
        let (mut manager, connector) = manager(&[]);
        manager.connect();
        let sink = sink(&connector);
        deliver(&mut manager, &sink, SessionEvent::Connected);
        deliver(
            &mut manager,
            &sink,
            SessionEvent::ErrorFrame {
                details: "{\"command\": \"ERROR\"}".to_string(),
            },
        );

        let last = manager.log().last().unwrap();
        assert_eq!(last.kind(), &EntryKind::Error);
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(manager.has_session());
    }

    #[test]
    fn test_close_event_resets_state_without_disconnect() {
        let (mut manager, connector) = manager(&["/q"]);
        manager.connect();
        let sink = sink(&connector);
        deliver(&mut manager, &sink, SessionEvent::Connected);
        deliver(&mut manager, &sink, SessionEvent::Closed);

        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!manager.has_session());
        assert_eq!(manager.log().last().unwrap().payload(), &json!(CLOSED_NOTICE));

        // Released session allows a fresh connect.
        assert!(manager.connect());
    }

    #[test]
    fn test_stale_session_cannot_change_state() {
        let (mut manager, connector) = manager(&["/q"]);
        manager.connect();
        let old = sink(&connector);
        manager.disconnect();
        manager.connect();
        let current = sink(&connector);
        assert_ne!(old.session(), current.session());

        deliver(&mut manager, &old, SessionEvent::Connected);
        assert_eq!(manager.state(), ConnectionState::Connecting);

        deliver(&mut manager, &old, message("/q", r#"{"unreadCount": 1}"#));
        assert_eq!(manager.unread(), 0);

        deliver(&mut manager, &old, SessionEvent::Closed);
        assert!(manager.has_session());
        assert_eq!(manager.state(), ConnectionState::Connecting);
        assert_eq!(manager.log().last().unwrap().payload(), &json!(CLOSED_NOTICE));
    }

    #[test]
    fn test_drain_events_respects_batch_limit() {
        let (mut manager, connector) = manager(&[]);
        manager.connect();
        let sink = sink(&connector);
        for i in 0..5 {
            sink.debug(format!("line {i}"));
        }
        assert_eq!(manager.drain_events(3), 3);
        assert_eq!(manager.drain_events(10), 2);
        assert_eq!(manager.log().len(), 5);
        assert_eq!(manager.log().entries()[0].payload(), &json!("line 0"));
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            url: "http://host/ws".to_string(),
            token: "t".to_string(),
            use_auth: true,
            ..Config::default()
        };
        let settings = ConnectionSettings::from_config(&config);
        assert_eq!(settings.url, "http://host/ws");
        assert_eq!(
            settings.connect_headers(),
            vec![("x-auth-token".to_string(), "t".to_string())]
        );
    }
}
