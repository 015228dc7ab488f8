//! Headless watch mode.
//!
//! Connects immediately and prints every log entry to stdout as one JSON
//! line until a shutdown signal arrives:
//!
//! ```text
//! {"at":"2026-10-19T09:30:00.123Z","kind":"LOG","payload":">>> CONNECT"}
//! {"at":"2026-10-19T09:30:00.200Z","kind":"channel:/queue/a","payload":{"unreadCount":3}}
//! ```

// Rust guideline compliant 2026-02

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use crate::client::Connector;
use crate::constants::{HEADLESS_TICK, MAX_EVENTS_PER_TICK};
use crate::session::{MessageEntry, SessionManager};

/// One output line for `entry` observed at `at`.
#[must_use]
pub fn format_entry(entry: &MessageEntry, at: DateTime<Utc>) -> String {
    json!({
        "at": at.to_rfc3339_opts(SecondsFormat::Millis, true),
        "kind": entry.kind().to_string(),
        "payload": entry.payload(),
    })
    .to_string()
}

/// Apply queued events and print entries from index `printed` on.
///
/// Returns the new printed count.
pub fn pump<C: Connector, W: Write>(
    manager: &mut SessionManager<C>,
    out: &mut W,
    printed: usize,
) -> Result<usize> {
    manager.drain_events(MAX_EVENTS_PER_TICK);
    let now = Utc::now();
    let fresh = manager.log().since(printed);
    for entry in fresh {
        writeln!(out, "{}", format_entry(entry, now)).context("Failed to write entry")?;
    }
    if !fresh.is_empty() {
        out.flush().context("Failed to flush output")?;
    }
    Ok(printed + fresh.len())
}

/// Connect and print entries until `shutdown` is raised.
pub fn run<C: Connector, W: Write>(
    manager: &mut SessionManager<C>,
    out: &mut W,
    shutdown: &AtomicBool,
) -> Result<()> {
    log::info!(
        "Watching {} ({} channels)",
        manager.settings().url,
        manager.subscriptions().len()
    );
    manager.connect();

    let mut printed = 0;
    while !shutdown.load(Ordering::Relaxed) {
        printed = pump(manager, out, printed)?;
        std::thread::sleep(HEADLESS_TICK);
    }

    log::info!("Watch stopping");
    manager.disconnect();
    pump(manager, out, printed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeConnector;
    use crate::client::TransportKind;
    use crate::session::{ConnectionSettings, EntryKind, SessionEvent};
    use chrono::TimeZone;

    fn manager() -> (SessionManager<FakeConnector>, FakeConnector) {
        let connector = FakeConnector::default();
        let settings = ConnectionSettings {
            url: "ws://h/stomp".to_string(),
            use_auth: false,
            token: String::new(),
            auth_header: "x-auth-token".to_string(),
            heartbeat_ms: 0,
            transport: TransportKind::WebSocket,
        };
        let manager = SessionManager::new(connector.clone(), settings, ["/queue/a"].into_iter().collect());
        (manager, connector)
    }

    #[test]
    fn test_format_entry() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let entry = MessageEntry::new(EntryKind::Channel("/queue/a".into()), json!({"x": 1}));
        assert_eq!(
            format_entry(&entry, at),
            r#"{"at":"2026-01-02T03:04:05.000Z","kind":"channel:/queue/a","payload":{"x":1}}"#
        );
    }

    #[test]
    fn test_pump_prints_each_entry_once() {
        let (mut manager, connector) = manager();
        manager.connect();
        let sink = connector.last_sink();
        sink.debug(">>> CONNECT");
        sink.emit(SessionEvent::Connected);
        sink.emit(SessionEvent::MessageReceived {
            destination: "/queue/a".to_string(),
            body: "{\"unreadCount\":2}".to_string(),
        });

        let mut out = Vec::new();
        let printed = pump(&mut manager, &mut out, 0).unwrap();
        assert_eq!(printed, 2);
        let printed = pump(&mut manager, &mut out, printed).unwrap();
        assert_eq!(printed, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "LOG");
        assert_eq!(lines[1]["kind"], "channel:/queue/a");
        assert_eq!(lines[1]["payload"]["unreadCount"], 2);
    }

    #[test]
    fn test_run_stops_on_shutdown_and_disconnects() {
        let (mut manager, connector) = manager();
        let shutdown = AtomicBool::new(true);
        let mut out = Vec::new();
        run(&mut manager, &mut out, &shutdown).unwrap();

        assert_eq!(connector.activation_count(), 1);
        assert_eq!(connector.recorded.borrow().deactivated.len(), 1);
        assert!(!manager.has_session());
    }
}
