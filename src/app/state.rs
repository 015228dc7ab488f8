//! Form focus state.

// Rust guideline compliant 2026-02

/// Form element that currently receives keystrokes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    /// Server URL field.
    #[default]
    Url,
    /// Auth token field (skipped while auth is off).
    Token,
    /// New-channel input.
    Channel,
    /// Subscription chips.
    Subscriptions,
    /// Message log.
    Log,
}

impl Focus {
    /// Focus ring order.
    const RING: [Self; 5] = [
        Self::Url,
        Self::Token,
        Self::Channel,
        Self::Subscriptions,
        Self::Log,
    ];

    /// Next element in the ring (Tab).
    #[must_use]
    pub fn next(self, use_auth: bool) -> Self {
        self.step(use_auth, 1)
    }

    /// Previous element in the ring (Shift+Tab).
    #[must_use]
    pub fn prev(self, use_auth: bool) -> Self {
        self.step(use_auth, Self::RING.len() - 1)
    }

    fn step(self, use_auth: bool, by: usize) -> Self {
        let len = Self::RING.len();
        let mut index = Self::RING.iter().position(|f| *f == self).unwrap_or(0);
        loop {
            index = (index + by) % len;
            let candidate = Self::RING[index];
            if candidate != Self::Token || use_auth {
                return candidate;
            }
        }
    }

    /// Whether the element is a text field.
    #[must_use]
    pub fn accepts_text_input(self) -> bool {
        matches!(self, Self::Url | Self::Token | Self::Channel)
    }

    /// Human-readable name for the status line.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Url => "URL",
            Self::Token => "Token",
            Self::Channel => "Channel",
            Self::Subscriptions => "Subscriptions",
            Self::Log => "Log",
        }
    }

    /// Focus to use after auth is toggled.
    ///
    /// Leaves the token field when it disappears.
    #[must_use]
    pub fn after_auth_toggle(self, use_auth: bool) -> Self {
        if self == Self::Token && !use_auth {
            Self::Url
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_without_auth_skips_token() {
        assert_eq!(Focus::Url.next(false), Focus::Channel);
        assert_eq!(Focus::Channel.prev(false), Focus::Url);
        assert_eq!(Focus::Log.next(false), Focus::Url);
        assert_eq!(Focus::Url.prev(false), Focus::Log);
    }

    #[test]
    fn test_ring_with_auth_includes_token() {
        assert_eq!(Focus::Url.next(true), Focus::Token);
        assert_eq!(Focus::Token.next(true), Focus::Channel);
        assert_eq!(Focus::Channel.prev(true), Focus::Token);
    }

    #[test]
    fn test_full_cycle_returns_home() {
        let mut focus = Focus::Url;
        for _ in 0..5 {
            focus = focus.next(true);
        }
        assert_eq!(focus, Focus::Url);
    }

    #[test]
    fn test_accepts_text_input() {
        assert!(Focus::Url.accepts_text_input());
        assert!(Focus::Token.accepts_text_input());
        assert!(Focus::Channel.accepts_text_input());
        assert!(!Focus::Subscriptions.accepts_text_input());
        assert!(!Focus::Log.accepts_text_input());
    }

    #[test]
    fn test_after_auth_toggle() {
        assert_eq!(Focus::Token.after_auth_toggle(false), Focus::Url);
        assert_eq!(Focus::Token.after_auth_toggle(true), Focus::Token);
        assert_eq!(Focus::Log.after_auth_toggle(false), Focus::Log);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(Focus::Subscriptions.display_name(), "Subscriptions");
        assert_eq!(Focus::default(), Focus::Url);
    }
}
