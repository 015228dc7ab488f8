//! Style helpers for the stompscope TUI.

// Rust guideline compliant 2026-02

use ratatui::style::{Color, Modifier, Style};

use crate::client::ConnectionState;
use crate::session::Tone;

/// Log line style for an entry tone: errors red, diagnostics grey.
#[must_use]
pub fn tone_style(tone: Tone) -> Style {
    match tone {
        Tone::Error => Style::default().fg(Color::Red),
        Tone::Log => Style::default().fg(Color::DarkGray),
        Tone::Normal => Style::default(),
    }
}

/// Status badge style for a connection state.
#[must_use]
pub fn state_style(state: ConnectionState) -> Style {
    let color = match state {
        ConnectionState::Disconnected => Color::Red,
        ConnectionState::Connecting => Color::Yellow,
        ConnectionState::Connected => Color::Green,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_style() {
        assert_eq!(tone_style(Tone::Error).fg, Some(Color::Red));
        assert_eq!(tone_style(Tone::Log).fg, Some(Color::DarkGray));
        assert_eq!(tone_style(Tone::Normal), Style::default());
    }

    #[test]
    fn test_state_style() {
        assert_eq!(state_style(ConnectionState::Connected).fg, Some(Color::Green));
        assert_eq!(state_style(ConnectionState::Connecting).fg, Some(Color::Yellow));
    }
}
