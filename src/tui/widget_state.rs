//! Persistent form state for the TUI.
//!
//! ```text
//! FormState (owned by TuiRunner)
//! ├── url: InputWidgetState
//! ├── token: InputWidgetState
//! ├── channel: InputWidgetState
//! └── selected_chip: usize
//! ```
//!
//! The URL and token buffers are copied into the session settings right
//! before each connect.

// Rust guideline compliant 2026-02

use tui_input::{Input, InputRequest};

use super::actions::TuiAction;

/// Persistent state for a text input.
///
/// Wraps [`tui_input::Input`] which manages the text buffer and cursor.
#[derive(Debug, Default, Clone)]
pub struct InputWidgetState {
    input: Input,
}

impl InputWidgetState {
    /// Create an empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input holding `value` with the cursor at the end.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            input: Input::default().with_value(value.into()),
        }
    }

    /// Current text.
    pub fn value(&self) -> &str {
        self.input.value()
    }

    /// Visual cursor column (wide characters counted).
    pub fn visual_cursor(&self) -> usize {
        self.input.visual_cursor()
    }

    /// Horizontal scroll offset for a viewport `width` columns wide.
    pub fn visual_scroll(&self, width: usize) -> usize {
        self.input.visual_scroll(width)
    }

    /// Apply an editing request.
    pub fn handle(&mut self, req: InputRequest) {
        self.input.handle(req);
    }

    /// Clear the buffer.
    pub fn reset(&mut self) {
        self.input.reset();
    }

    /// Return the text and clear the buffer.
    pub fn take(&mut self) -> String {
        let value = self.input.value().to_string();
        self.input.reset();
        value
    }
}

/// Map an editing action onto a `tui_input` request.
///
/// Returns `None` for actions that are not text edits.
pub fn edit_request(action: &TuiAction) -> Option<InputRequest> {
    Some(match action {
        TuiAction::InputChar(c) => InputRequest::InsertChar(*c),
        TuiAction::InputBackspace => InputRequest::DeletePrevChar,
        TuiAction::InputDelete => InputRequest::DeleteNextChar,
        TuiAction::CursorLeft => InputRequest::GoToPrevChar,
        TuiAction::CursorRight => InputRequest::GoToNextChar,
        TuiAction::CursorHome => InputRequest::GoToStart,
        TuiAction::CursorEnd => InputRequest::GoToEnd,
        TuiAction::DeleteWord => InputRequest::DeletePrevWord,
        _ => return None,
    })
}

/// Form fields plus the selected subscription chip.
#[derive(Debug, Default, Clone)]
pub struct FormState {
    /// Server URL field.
    pub url: InputWidgetState,
    /// Auth token field.
    pub token: InputWidgetState,
    /// New-channel field.
    pub channel: InputWidgetState,
    selected_chip: usize,
}

impl FormState {
    /// Form pre-filled with a URL and token.
    pub fn new(url: &str, token: &str) -> Self {
        Self {
            url: InputWidgetState::with_value(url),
            token: InputWidgetState::with_value(token),
            channel: InputWidgetState::new(),
            selected_chip: 0,
        }
    }

    /// Index of the selected chip.
    pub fn selected_chip(&self) -> usize {
        self.selected_chip
    }

    /// Select the previous chip.
    pub fn chip_prev(&mut self) {
        self.selected_chip = self.selected_chip.saturating_sub(1);
    }

    /// Select the next chip, staying below `count`.
    pub fn chip_next(&mut self, count: usize) {
        if self.selected_chip + 1 < count {
            self.selected_chip += 1;
        }
    }

    /// Keep the selection inside `count` chips.
    pub fn clamp_chip(&mut self, count: usize) {
        self.selected_chip = self.selected_chip.min(count.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_basic_operations() {
        let mut state = InputWidgetState::new();
        state.handle(InputRequest::InsertChar('h'));
        state.handle(InputRequest::InsertChar('i'));
        assert_eq!(state.value(), "hi");
        assert_eq!(state.visual_cursor(), 2);

        state.handle(InputRequest::DeletePrevChar);
        assert_eq!(state.value(), "h");
    }

    #[test]
    fn input_with_value_puts_cursor_at_end() {
        let mut state = InputWidgetState::with_value("ws://h");
        assert_eq!(state.visual_cursor(), 6);
        state.handle(InputRequest::InsertChar('x'));
        assert_eq!(state.value(), "ws://hx");
    }

    #[test]
    fn input_take_clears() {
        let mut state = InputWidgetState::with_value("/queue/a");
        assert_eq!(state.take(), "/queue/a");
        assert_eq!(state.value(), "");
    }

    #[test]
    fn edit_request_mapping() {
        assert_eq!(
            edit_request(&TuiAction::InputChar('a')),
            Some(InputRequest::InsertChar('a'))
        );
        assert_eq!(
            edit_request(&TuiAction::InputBackspace),
            Some(InputRequest::DeletePrevChar)
        );
        assert_eq!(edit_request(&TuiAction::Connect), None);
    }

    #[test]
    fn chip_selection_bounds() {
        let mut form = FormState::new("u", "t");
        form.chip_next(3);
        form.chip_next(3);
        form.chip_next(3);
        assert_eq!(form.selected_chip(), 2);
        form.chip_prev();
        assert_eq!(form.selected_chip(), 1);

        form.clamp_chip(1);
        assert_eq!(form.selected_chip(), 0);
        form.chip_prev();
        assert_eq!(form.selected_chip(), 0);
    }
}
