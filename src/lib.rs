//! stompscope - interactive tester for STOMP-over-WebSocket endpoints.
//!
//! Enter a server URL and optional auth token, subscribe to destinations,
//! connect, and watch messages, client diagnostics and error frames scroll
//! by in a terminal UI (or as JSON lines in headless watch mode).
//!
//! # Architecture
//!
//! - **SessionManager** - owns settings, subscriptions, the live session,
//!   the message log and the unread counter
//! - **Client** - STOMP 1.2 over WebSocket or SockJS, reached through the
//!   `Connector` / `SessionHandle` capability traits
//! - **TUI** - form, chips and log rendered with ratatui
//!
//! # Modules
//!
//! - [`session`] - Session manager, events, message log
//! - [`client`] - Capability traits, STOMP codec and client
//! - [`tui`] - Terminal UI runner and rendering
//! - [`headless`] - JSON-lines watch mode
//! - [`config`] - Configuration loading/saving

pub mod app;
pub mod client;
pub mod headless;
pub mod session;
pub mod tui;
pub mod ws;

pub mod config;
pub mod constants;
pub mod env;

// Re-export commonly used types
pub use client::{ClientConfig, ConnectionState, Connector, SessionHandle, StompConnector};
pub use config::Config;
pub use session::{ConnectionSettings, SessionEvent, SessionManager, SubscriptionSet};
