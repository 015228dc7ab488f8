//! Runtime environment detection.
//!
//! Single source of truth for the runtime environment, read from the
//! `STOMPSCOPE_ENV` environment variable.
//!
//! Set `STOMPSCOPE_ENV` to one of:
//! - `test` - Test mode (config and logs stay inside the project `tmp/`)
//! - `development` or `dev` - Development mode (debug logging by default)
//! - (anything else or unset) - Production mode

/// Runtime environment for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment (default).
    Production,
    /// Development environment.
    Development,
    /// Test environment.
    Test,
}

impl Environment {
    /// Detect current environment from `STOMPSCOPE_ENV`.
    #[must_use]
    pub fn current() -> Self {
        Self::from_value(std::env::var("STOMPSCOPE_ENV").ok().as_deref())
    }

    /// Map a raw `STOMPSCOPE_ENV` value to an environment.
    #[must_use]
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            Some("test") => Self::Test,
            Some("development" | "dev") => Self::Development,
            _ => Self::Production,
        }
    }

    /// Returns `true` if this is the test environment.
    #[must_use]
    pub fn is_test(self) -> bool {
        self == Self::Test
    }

    /// Default `env_logger` filter for this environment.
    ///
    /// `RUST_LOG` still takes precedence.
    #[must_use]
    pub fn default_log_filter(self) -> &'static str {
        match self {
            Self::Production => "info",
            Self::Development | Self::Test => "debug",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Development => write!(f, "development"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Convenience check for test mode.
///
/// Equivalent to `Environment::current().is_test()`.
#[must_use]
pub fn is_test_mode() -> bool {
    Environment::current().is_test()
}
