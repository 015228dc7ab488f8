//! Application-wide constants for stompscope.
//!
//! # Categories
//!
//! - **Session**: values handed to the messaging client on connect
//! - **Protocol**: STOMP handshake and framing constants
//! - **Event loop**: UI tick pacing

use std::time::Duration;

// ============================================================================
// Session
// ============================================================================

/// Delay between reconnection attempts while a session is still connecting.
///
/// Fixed by the session manager; the retry loop itself lives in the client.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// Default heart-beat interval offered in both directions.
pub const DEFAULT_HEARTBEAT_MS: u64 = 10_000;

/// Default header carrying the auth token on CONNECT.
pub const DEFAULT_AUTH_HEADER: &str = "x-auth-token";

/// Default server URL shown in a fresh form.
pub const DEFAULT_URL: &str = "http://my-socket-server";

/// Channel subscribed in a fresh configuration.
pub const DEFAULT_SUBSCRIPTION: &str = "/user/queue/notifications";

/// Payload field whose value overwrites the unread counter.
pub const UNREAD_COUNT_FIELD: &str = "unreadCount";

// ============================================================================
// Protocol
// ============================================================================

/// Timeout for the CONNECT → CONNECTED exchange (and the SockJS open frame).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// STOMP versions offered in `accept-version`.
pub const STOMP_ACCEPT_VERSION: &str = "1.2,1.1,1.0";

/// WebSocket subprotocols offered for plain STOMP-over-WebSocket.
pub const STOMP_SUBPROTOCOLS: &str = "v12.stomp, v11.stomp, v10.stomp";

/// Incoming silence tolerated, as a multiple of the negotiated heart-beat.
pub const HEARTBEAT_GRACE_FACTOR: u32 = 2;

// ============================================================================
// Event loop
// ============================================================================

/// TUI frame rate delay (approximately 60fps).
pub const FRAME_RATE_DELAY: Duration = Duration::from_millis(16);

/// Input poll timeout per tick.
pub const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Headless loop tick.
pub const HEADLESS_TICK: Duration = Duration::from_millis(100);

/// Maximum session events applied per tick.
pub const MAX_EVENTS_PER_TICK: usize = 256;

/// Lines moved by PageUp/PageDown in the log panel.
pub const LOG_PAGE_LINES: usize = 10;
