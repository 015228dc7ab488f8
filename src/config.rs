//! Configuration loading and persistence.
//!
//! Handles reading and writing the stompscope configuration file.
//! The auth token is never written to disk; it comes from the environment
//! or the command line.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::client::TransportKind;
use crate::constants::{
    DEFAULT_AUTH_HEADER, DEFAULT_HEARTBEAT_MS, DEFAULT_SUBSCRIPTION, DEFAULT_URL,
};

/// File name of the configuration inside the config directory.
const CONFIG_FILE: &str = "config.json";

/// Configuration for the stompscope CLI.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Endpoint URL (`http(s)://` for SockJS, `ws(s)://` for raw STOMP).
    pub url: String,
    /// Whether the token is sent as a CONNECT header.
    pub use_auth: bool,
    /// Token - NOT serialized to disk.
    #[serde(skip)]
    pub token: String,
    /// Name of the CONNECT header carrying the token.
    pub auth_header: String,
    /// Destinations subscribed on connect, in display order.
    pub subscriptions: Vec<String>,
    /// Heart-beat interval offered in both directions (0 disables).
    pub heartbeat_ms: u64,
    /// Transport framing.
    pub transport: TransportKind,
    /// Save the form (URL, auth toggle, subscriptions) when the TUI exits.
    pub remember: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            use_auth: false,
            token: String::new(),
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
            subscriptions: vec![DEFAULT_SUBSCRIPTION.to_string()],
            heartbeat_ms: DEFAULT_HEARTBEAT_MS,
            transport: TransportKind::Auto,
            remember: true,
        }
    }
}

impl Config {
    /// Returns the configuration directory path, creating it if necessary.
    ///
    /// Directory selection priority:
    /// 1. `STOMPSCOPE_CONFIG_DIR` env var: explicit override
    /// 2. `STOMPSCOPE_ENV=test`: `tmp/stompscope-test` in the project
    /// 3. Default: platform config dir + `stompscope`
    pub fn config_dir() -> Result<PathBuf> {
        let dir = if let Ok(dir) = std::env::var("STOMPSCOPE_CONFIG_DIR") {
            PathBuf::from(dir)
        } else if crate::env::is_test_mode() {
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tmp/stompscope-test")
        } else {
            dirs::config_dir()
                .context("Could not determine config directory")?
                .join("stompscope")
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create config dir {}", dir.display()))?;
        Ok(dir)
    }

    /// Loads configuration from the config directory, with environment overrides.
    ///
    /// A missing file falls back to defaults. A file that exists but cannot
    /// be read or parsed is an error, so it is never overwritten on save.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_or_default(&Self::config_dir()?.join(CONFIG_FILE))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Reads `path`, or returns defaults when it does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            log::debug!("No config at {}; using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Reads a configuration file without applying overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("STOMPSCOPE_URL") {
            self.url = url;
        }

        if let Ok(token) = std::env::var("STOMPSCOPE_TOKEN") {
            self.token = token;
            self.use_auth = true;
        }

        if let Ok(header) = std::env::var("STOMPSCOPE_AUTH_HEADER") {
            self.auth_header = header;
        }

        if let Ok(heartbeat) = std::env::var("STOMPSCOPE_HEARTBEAT_MS") {
            if let Ok(ms) = heartbeat.parse::<u64>() {
                self.heartbeat_ms = ms;
            }
        }
    }

    /// Persists the configuration to the config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Persists the configuration to `path` (token excluded).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("failed to write {}", path.display()))?;

        // Set restrictive permissions (owner read/write only)
        #[cfg(unix)]
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

        Ok(())
    }

    /// Whether a token is available to send.
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}
