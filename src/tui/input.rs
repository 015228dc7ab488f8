//! Terminal input handling for the TUI.
//!
//! Converts crossterm events into [`TuiAction`]s. Global shortcuts use
//! Ctrl combinations so plain keys always reach the focused text field.
//!
//! ```text
//! crossterm::Event ──► event_to_action(event, focus) ──► TuiAction
//!                                                          │
//!                                 TuiRunner::handle_action ◄┘
//! ```

// Rust guideline compliant 2026-02

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};

use super::actions::TuiAction;
use crate::app::Focus;
use crate::constants::LOG_PAGE_LINES;

/// Lines scrolled per mouse wheel notch.
const WHEEL_LINES: usize = 3;

/// Convert a crossterm event to an action for the focused element.
#[must_use]
pub fn event_to_action(event: &Event, focus: Focus) -> TuiAction {
    match event {
        Event::Key(key) => key_event_to_action(key, focus),
        Event::Mouse(mouse) => mouse_event_to_action(mouse),
        _ => TuiAction::None,
    }
}

/// Convert a key event to an action.
///
/// Global shortcuts:
/// - `Ctrl+Q` / `Ctrl+C` - Quit
/// - `Ctrl+O` - Connect
/// - `Ctrl+D` - Disconnect
/// - `Ctrl+A` - Toggle auth
/// - `Ctrl+L` - Clear log
/// - `Tab` / `Shift+Tab` - Move focus
#[must_use]
pub fn key_event_to_action(key: &KeyEvent, focus: Focus) -> TuiAction {
    if key.kind != KeyEventKind::Press {
        return TuiAction::None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q' | 'c') if ctrl => return TuiAction::Quit,
        KeyCode::Char('o') if ctrl => return TuiAction::Connect,
        KeyCode::Char('d') if ctrl => return TuiAction::Disconnect,
        KeyCode::Char('a') if ctrl => return TuiAction::ToggleAuth,
        KeyCode::Char('l') if ctrl => return TuiAction::ClearLog,
        KeyCode::Tab => return TuiAction::FocusNext,
        KeyCode::BackTab => return TuiAction::FocusPrev,
        _ => {}
    }

    match focus {
        Focus::Url | Focus::Token | Focus::Channel => text_input_key(key),
        Focus::Subscriptions => chip_key(key),
        Focus::Log => log_key(key),
    }
}

/// Keys for a focused text field.
fn text_input_key(key: &KeyEvent) -> TuiAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => TuiAction::Submit,
        KeyCode::Char('w') if ctrl => TuiAction::DeleteWord,
        KeyCode::Char(_) if ctrl => TuiAction::None,
        KeyCode::Char(c) => TuiAction::InputChar(c),
        KeyCode::Backspace => TuiAction::InputBackspace,
        KeyCode::Delete => TuiAction::InputDelete,
        KeyCode::Left => TuiAction::CursorLeft,
        KeyCode::Right => TuiAction::CursorRight,
        KeyCode::Home => TuiAction::CursorHome,
        KeyCode::End => TuiAction::CursorEnd,
        _ => TuiAction::None,
    }
}

/// Keys for the subscription chips.
fn chip_key(key: &KeyEvent) -> TuiAction {
    match key.code {
        KeyCode::Left => TuiAction::ChipPrev,
        KeyCode::Right => TuiAction::ChipNext,
        KeyCode::Delete | KeyCode::Backspace => TuiAction::RemoveChip,
        _ => TuiAction::None,
    }
}

/// Keys for the message log.
fn log_key(key: &KeyEvent) -> TuiAction {
    match key.code {
        KeyCode::Up => TuiAction::ScrollUp(1),
        KeyCode::Down => TuiAction::ScrollDown(1),
        KeyCode::PageUp => TuiAction::ScrollUp(LOG_PAGE_LINES),
        KeyCode::PageDown => TuiAction::ScrollDown(LOG_PAGE_LINES),
        KeyCode::Home => TuiAction::ScrollToTop,
        KeyCode::End => TuiAction::ScrollToBottom,
        _ => TuiAction::None,
    }
}

/// Mouse wheel scrolls the log regardless of focus.
fn mouse_event_to_action(mouse: &MouseEvent) -> TuiAction {
    match mouse.kind {
        MouseEventKind::ScrollUp => TuiAction::ScrollUp(WHEEL_LINES),
        MouseEventKind::ScrollDown => TuiAction::ScrollDown(WHEEL_LINES),
        _ => TuiAction::None,
    }
}
