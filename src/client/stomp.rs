//! STOMP 1.2 client over WebSocket or SockJS.
//!
//! [`StompConnector::activate`] spawns one task per session on the tokio
//! runtime and returns a [`StompSession`] handle. The task:
//!
//! 1. Opens the transport and performs the CONNECT/CONNECTED handshake,
//!    retrying every `reconnect_delay` until it succeeds or is deactivated.
//! 2. Emits [`SessionEvent::Connected`], then serves SUBSCRIBE requests and
//!    relays MESSAGE and ERROR frames until the transport closes.
//! 3. Emits [`SessionEvent::Closed`] exactly once on the way out.
//!
//! Every frame sent or received is echoed to the event sink as a debug
//! line (`>>> SUBSCRIBE`, `<<< MESSAGE`, ...).

// Rust guideline compliant 2026-02

use std::collections::VecDeque;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

use super::frame::{split_frames, Chunk, Command, Frame};
use super::sockjs::{self, SockJsFrame};
use super::{ClientConfig, ClientError, Connector, EventSink, SessionHandle, TransportKind};
use crate::constants::{
    CONNECT_TIMEOUT, HEARTBEAT_GRACE_FACTOR, STOMP_ACCEPT_VERSION, STOMP_SUBPROTOCOLS,
};
use crate::session::SessionEvent;
use crate::ws::{self, WsMessage, WsReader, WsWriter};

/// Requests from the handle to the session task.
#[derive(Debug)]
enum ClientCommand {
    Subscribe(String),
}

/// Spawns STOMP sessions on a tokio runtime.
#[derive(Debug, Clone)]
pub struct StompConnector {
    runtime: Handle,
}

impl StompConnector {
    /// Create a connector that spawns onto `runtime`.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl Connector for StompConnector {
    type Handle = StompSession;

    fn activate(&self, config: ClientConfig, events: EventSink) -> StompSession {
        let token = CancellationToken::new();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        log::debug!("Spawning STOMP session {} for {}", events.session(), config.url);
        self.runtime.spawn(run_connection_loop(
            config,
            events,
            commands_rx,
            token.clone(),
        ));

        StompSession {
            commands: commands_tx,
            _guard: token.drop_guard(),
        }
    }
}

/// Handle to a running STOMP session task.
///
/// Dropping the handle cancels the task, which then sends DISCONNECT and
/// closes the socket.
pub struct StompSession {
    commands: mpsc::UnboundedSender<ClientCommand>,
    _guard: DropGuard,
}

impl std::fmt::Debug for StompSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StompSession")
            .field("running", &!self.commands.is_closed())
            .finish_non_exhaustive()
    }
}

impl SessionHandle for StompSession {
    fn subscribe(&mut self, destination: &str) {
        if self
            .commands
            .send(ClientCommand::Subscribe(destination.to_string()))
            .is_err()
        {
            log::debug!("Subscribe to {} after session ended", destination);
        }
    }

    fn deactivate(self) {
        log::debug!("Deactivating STOMP session");
        drop(self);
    }
}

/// Negotiated heart-beat intervals. Zero means disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Heartbeat {
    /// How often we send an EOL.
    pub outgoing: Duration,
    /// How often the server promised to send something.
    pub incoming: Duration,
}

impl Heartbeat {
    /// Negotiate against the server's `heart-beat` header value.
    ///
    /// Each direction is disabled when either side declines it, otherwise
    /// the larger of the two intervals wins.
    #[must_use]
    pub fn negotiate(outgoing: Duration, incoming: Duration, server: Option<&str>) -> Self {
        let Some((server_send, server_recv)) = server.and_then(parse_heartbeat) else {
            return Self::default();
        };
        let pick = |ours: Duration, theirs: Duration| {
            if ours.is_zero() || theirs.is_zero() {
                Duration::ZERO
            } else {
                ours.max(theirs)
            }
        };
        Self {
            outgoing: pick(outgoing, server_recv),
            incoming: pick(incoming, server_send),
        }
    }
}

fn parse_heartbeat(value: &str) -> Option<(Duration, Duration)> {
    let (send, recv) = value.split_once(',')?;
    let send = send.trim().parse().ok()?;
    let recv = recv.trim().parse().ok()?;
    Some((Duration::from_millis(send), Duration::from_millis(recv)))
}

/// CONNECT frame for `config`.
#[must_use]
pub fn connect_frame(config: &ClientConfig) -> Frame {
    let mut frame = Frame::new(Command::Connect)
        .header("accept-version", STOMP_ACCEPT_VERSION)
        .header(
            "heart-beat",
            format!(
                "{},{}",
                config.heartbeat_outgoing.as_millis(),
                config.heartbeat_incoming.as_millis()
            ),
        );
    for (name, value) in &config.connect_headers {
        frame = frame.header(name.clone(), value.clone());
    }
    frame
}

/// WebSocket URL and handshake headers for the resolved transport.
fn transport_target(config: &ClientConfig) -> (TransportKind, String, Vec<(&'static str, &'static str)>) {
    match config.transport.resolve(&config.url) {
        TransportKind::Sockjs => (
            TransportKind::Sockjs,
            sockjs::websocket_url(&config.url),
            Vec::new(),
        ),
        _ => (
            TransportKind::WebSocket,
            ws::http_to_ws_scheme(&config.url),
            vec![("Sec-WebSocket-Protocol", STOMP_SUBPROTOCOLS)],
        ),
    }
}

/// Something read off the transport.
#[derive(Debug)]
enum Inbound {
    /// SockJS session opened.
    Open,
    /// STOMP EOL or SockJS `h`.
    Heartbeat,
    /// A STOMP frame.
    Frame(Frame),
    /// WebSocket ping to answer.
    Ping(Vec<u8>),
    /// Transport closed by the server.
    Closed { code: u16, reason: String },
}

/// Outgoing half: STOMP text, SockJS-wrapped when needed.
struct FrameWriter {
    writer: WsWriter,
    framing: TransportKind,
    events: EventSink,
}

impl FrameWriter {
    async fn send(&mut self, frame: &Frame) -> Result<(), ClientError> {
        self.events.debug(format!(">>> {}", frame.to_string().trim_end()));
        self.send_raw(&frame.encode()).await
    }

    async fn send_heartbeat(&mut self) -> Result<(), ClientError> {
        self.events.debug(">>> PING");
        self.send_raw("\n").await
    }

    async fn send_pong(&mut self, data: Vec<u8>) -> Result<(), ClientError> {
        self.writer
            .send_pong(data)
            .await
            .map_err(|e| ClientError::Transport(format!("{e:#}")))
    }

    async fn send_raw(&mut self, data: &str) -> Result<(), ClientError> {
        let text = match self.framing {
            TransportKind::Sockjs => sockjs::encode(data),
            _ => data.to_string(),
        };
        self.writer
            .send_text(&text)
            .await
            .map_err(|e| ClientError::Transport(format!("{e:#}")))
    }

    async fn close(&mut self) {
        if let Err(e) = self.writer.close().await {
            log::debug!("WebSocket close: {:#}", e);
        }
    }
}

/// Incoming half: splits transport messages into frames.
///
/// One transport message may carry several frames; extras wait in
/// `pending` so `next` stays cancel-safe inside `select!`.
struct FrameReader {
    reader: WsReader,
    framing: TransportKind,
    events: EventSink,
    pending: VecDeque<Inbound>,
}

impl FrameReader {
    async fn next(&mut self) -> Option<Result<Inbound, ClientError>> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(Ok(item));
            }
            let message = match self.reader.recv().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(ClientError::Transport(format!("{e:#}")))),
            };
            match message {
                WsMessage::Text(text) => self.ingest(&text),
                WsMessage::Binary(data) => self.ingest(&String::from_utf8_lossy(&data)),
                WsMessage::Ping(data) => return Some(Ok(Inbound::Ping(data))),
                WsMessage::Close { code, reason } => {
                    return Some(Ok(Inbound::Closed { code, reason }))
                }
            }
        }
    }

    fn ingest(&mut self, text: &str) {
        if self.framing != TransportKind::Sockjs {
            self.ingest_stomp(text);
            return;
        }
        match sockjs::decode(text) {
            Ok(SockJsFrame::Open) => self.pending.push_back(Inbound::Open),
            Ok(SockJsFrame::Heartbeat) => self.pending.push_back(Inbound::Heartbeat),
            Ok(SockJsFrame::Messages(messages)) => {
                for message in &messages {
                    self.ingest_stomp(message);
                }
            }
            Ok(SockJsFrame::Close { code, reason }) => {
                self.pending.push_back(Inbound::Closed { code, reason });
            }
            Err(e) => self.events.debug(format!("Ignoring SockJS message: {e}")),
        }
    }

    fn ingest_stomp(&mut self, data: &str) {
        for chunk in split_frames(data) {
            match chunk {
                Chunk::Heartbeat => {
                    self.events.debug("<<< PONG");
                    self.pending.push_back(Inbound::Heartbeat);
                }
                Chunk::Frame(text) => match Frame::parse(text) {
                    Ok(frame) => {
                        self.events.debug(format!("<<< {}", frame.to_string().trim_end()));
                        self.pending.push_back(Inbound::Frame(frame));
                    }
                    Err(e) => self.events.debug(format!("Ignoring undecodable frame: {e}")),
                },
            }
        }
    }
}

/// An established STOMP session.
struct Connection {
    writer: FrameWriter,
    reader: FrameReader,
    heartbeat: Heartbeat,
}

/// Run the session task: connect with retries, then serve until closed.
async fn run_connection_loop(
    config: ClientConfig,
    events: EventSink,
    mut commands: mpsc::UnboundedReceiver<ClientCommand>,
    token: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let result = tokio::select! {
            biased;
            () = token.cancelled() => break,
            result = open(&config, &events) => result,
        };

        match result {
            Ok(connection) => {
                log::info!("STOMP session {} connected to {}", events.session(), config.url);
                serve(connection, &events, &mut commands, &token).await;
                break;
            }
            Err(e) => {
                log::warn!("STOMP connect attempt {} to {} failed: {}", attempt, config.url, e);
                events.debug(format!("Whoops! Lost connection to {}: {e}", config.url));
            }
        }

        if config.reconnect_delay.is_zero() {
            break;
        }
        events.debug(format!(
            "STOMP: scheduling reconnection in {}ms",
            config.reconnect_delay.as_millis()
        ));

        tokio::select! {
            biased;
            () = token.cancelled() => break,
            () = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }

    log::debug!("STOMP session {} finished", events.session());
    events.emit(SessionEvent::Closed);
}

/// Open the transport and complete the STOMP handshake.
async fn open(config: &ClientConfig, events: &EventSink) -> Result<Connection, ClientError> {
    let (framing, url, headers) = transport_target(config);
    events.debug(format!("Opening Web Socket... {url}"));

    let ws = ws::connect(&url, &headers)
        .await
        .map_err(|e| ClientError::ConnectionFailed(format!("{e:#}")))?;
    events.debug("Web Socket Opened...");
    if let Some(protocol) = &ws.subprotocol {
        log::debug!("Server selected subprotocol {}", protocol);
    }

    let writer = FrameWriter {
        writer: ws.writer,
        framing,
        events: events.clone(),
    };
    let reader = FrameReader {
        reader: ws.reader,
        framing,
        events: events.clone(),
        pending: VecDeque::new(),
    };

    tokio::time::timeout(CONNECT_TIMEOUT, handshake(writer, reader, config, events))
        .await
        .map_err(|_| ClientError::Timeout)?
}

async fn handshake(
    mut writer: FrameWriter,
    mut reader: FrameReader,
    config: &ClientConfig,
    events: &EventSink,
) -> Result<Connection, ClientError> {
    if writer.framing == TransportKind::Sockjs {
        loop {
            match reader.next().await {
                Some(Ok(Inbound::Open)) => break,
                Some(Ok(Inbound::Closed { .. })) | None => return Err(ClientError::Closed),
                Some(Err(e)) => return Err(e),
                Some(Ok(_)) => continue,
            }
        }
    }

    writer.send(&connect_frame(config)).await?;

    loop {
        match reader.next().await {
            Some(Ok(Inbound::Frame(frame))) => match frame.command() {
                Command::Connected => {
                    let heartbeat = Heartbeat::negotiate(
                        config.heartbeat_outgoing,
                        config.heartbeat_incoming,
                        frame.get("heart-beat"),
                    );
                    log::debug!(
                        "Negotiated STOMP {} heart-beat {:?}",
                        frame.get("version").unwrap_or("1.0"),
                        heartbeat
                    );
                    return Ok(Connection {
                        writer,
                        reader,
                        heartbeat,
                    });
                }
                Command::Error => {
                    let reason = frame.get("message").unwrap_or("ERROR").to_string();
                    events.emit(error_event(&frame));
                    writer.close().await;
                    return Err(ClientError::Rejected(reason));
                }
                other => log::debug!("Ignoring {} before CONNECTED", other),
            },
            Some(Ok(Inbound::Ping(data))) => writer.send_pong(data).await?,
            Some(Ok(Inbound::Closed { .. })) | None => return Err(ClientError::Closed),
            Some(Ok(Inbound::Open | Inbound::Heartbeat)) => {}
            Some(Err(e)) => return Err(e),
        }
    }
}

/// Serve an established session until the transport closes or the handle
/// is dropped.
async fn serve(
    connection: Connection,
    events: &EventSink,
    commands: &mut mpsc::UnboundedReceiver<ClientCommand>,
    token: &CancellationToken,
) {
    let Connection {
        mut writer,
        mut reader,
        heartbeat,
    } = connection;

    events.emit(SessionEvent::Connected);

    // (subscription id, destination)
    let mut subscriptions: Vec<(String, String)> = Vec::new();

    let ping_period = heartbeat.outgoing.max(Duration::from_millis(1));
    let mut ping = interval_at(Instant::now() + ping_period, ping_period);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let silence_limit = heartbeat.incoming * HEARTBEAT_GRACE_FACTOR;
    let check_period = heartbeat.incoming.max(Duration::from_millis(1));
    let mut health = interval_at(Instant::now() + check_period, check_period);
    health.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            biased;

            () = token.cancelled() => {
                disconnect(&mut writer, events).await;
                return;
            }

            command = commands.recv() => {
                let Some(ClientCommand::Subscribe(destination)) = command else {
                    // Handle dropped.
                    disconnect(&mut writer, events).await;
                    return;
                };
                let id = format!("sub-{}", subscriptions.len());
                let frame = Frame::new(Command::Subscribe)
                    .header("id", id.clone())
                    .header("destination", destination.clone());
                if let Err(e) = writer.send(&frame).await {
                    events.debug(format!("Subscribe to {destination} failed: {e}"));
                    break;
                }
                subscriptions.push((id, destination));
            }

            inbound = reader.next() => {
                last_activity = Instant::now();
                match inbound {
                    Some(Ok(Inbound::Frame(frame))) => handle_frame(&frame, &subscriptions, events),
                    Some(Ok(Inbound::Ping(data))) => {
                        if let Err(e) = writer.send_pong(data).await {
                            events.debug(format!("Pong failed: {e}"));
                            break;
                        }
                    }
                    Some(Ok(Inbound::Open | Inbound::Heartbeat)) => {}
                    Some(Ok(Inbound::Closed { code, reason })) => {
                        events.debug(format!("Connection closed ({code}) {reason}"));
                        break;
                    }
                    Some(Err(e)) => {
                        events.debug(format!("Connection error: {e}"));
                        break;
                    }
                    None => {
                        events.debug("Connection ended");
                        break;
                    }
                }
            }

            _ = ping.tick(), if !heartbeat.outgoing.is_zero() => {
                if let Err(e) = writer.send_heartbeat().await {
                    events.debug(format!("Heart-beat failed: {e}"));
                    break;
                }
            }

            _ = health.tick(), if !heartbeat.incoming.is_zero() => {
                let silent = last_activity.elapsed();
                if silent > silence_limit {
                    log::warn!("STOMP session {} silent for {}ms", events.session(), silent.as_millis());
                    events.debug(format!(
                        "Did not receive server activity for the last {}ms",
                        silent.as_millis()
                    ));
                    writer.close().await;
                    break;
                }
            }
        }
    }

    log::info!("STOMP session {} closed", events.session());
}

async fn disconnect(writer: &mut FrameWriter, events: &EventSink) {
    if let Err(e) = writer.send(&Frame::new(Command::Disconnect)).await {
        log::debug!("DISCONNECT not sent: {}", e);
    }
    writer.close().await;
    events.debug("Disconnected");
    log::info!("STOMP session {} deactivated", events.session());
}

fn handle_frame(frame: &Frame, subscriptions: &[(String, String)], events: &EventSink) {
    match frame.command() {
        Command::Message => {
            let destination = frame
                .get("subscription")
                .and_then(|id| {
                    subscriptions
                        .iter()
                        .find(|(sub_id, _)| sub_id == id)
                        .map(|(_, destination)| destination.as_str())
                })
                .or_else(|| frame.get("destination"))
                .unwrap_or_default()
                .to_string();
            events.emit(SessionEvent::MessageReceived {
                destination,
                body: frame.body_str().to_string(),
            });
        }
        Command::Error => events.emit(error_event(frame)),
        other => log::debug!("Unhandled {} frame", other),
    }
}

fn error_event(frame: &Frame) -> SessionEvent {
    let json = frame.to_json();
    SessionEvent::ErrorFrame {
        details: serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string()),
    }
}
