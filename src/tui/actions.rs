//! TUI actions.
//!
//! Key presses are translated into a [`TuiAction`] by the input module and
//! applied by the runner. Session actions go to the session manager; the
//! rest only touch form, focus or scroll state.

// Rust guideline compliant 2026-02

/// Actions the runner knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuiAction {
    // === Application Control ===
    /// Request quit.
    Quit,

    // === Session ===
    /// Connect with the current form values.
    Connect,

    /// Disconnect the current session.
    Disconnect,

    /// Toggle sending the auth header.
    ToggleAuth,

    /// Clear the message log.
    ClearLog,

    // === Focus ===
    /// Focus the next form element.
    FocusNext,

    /// Focus the previous form element.
    FocusPrev,

    /// Enter on the focused element.
    Submit,

    // === Text Input ===
    /// Insert a character.
    InputChar(char),

    /// Delete before the cursor.
    InputBackspace,

    /// Delete under the cursor.
    InputDelete,

    /// Delete the word before the cursor.
    DeleteWord,

    /// Move the cursor left.
    CursorLeft,

    /// Move the cursor right.
    CursorRight,

    /// Move the cursor to the start.
    CursorHome,

    /// Move the cursor to the end.
    CursorEnd,

    // === Subscription Chips ===
    /// Select the previous chip.
    ChipPrev,

    /// Select the next chip.
    ChipNext,

    /// Remove the selected chip.
    RemoveChip,

    // === Log Scrolling ===
    /// Scroll up by N lines.
    ScrollUp(usize),

    /// Scroll down by N lines.
    ScrollDown(usize),

    /// Scroll to the oldest entry.
    ScrollToTop,

    /// Scroll to the newest entry and follow.
    ScrollToBottom,

    /// No action.
    None,
}

impl TuiAction {
    /// Whether the action edits a text field.
    #[must_use]
    pub fn is_text_edit(self) -> bool {
        matches!(
            self,
            Self::InputChar(_)
                | Self::InputBackspace
                | Self::InputDelete
                | Self::DeleteWord
                | Self::CursorLeft
                | Self::CursorRight
                | Self::CursorHome
                | Self::CursorEnd
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_text_edit() {
        assert!(TuiAction::InputChar('x').is_text_edit());
        assert!(TuiAction::CursorEnd.is_text_edit());
        assert!(!TuiAction::Connect.is_text_edit());
        assert!(!TuiAction::ScrollUp(1).is_text_edit());
    }
}
