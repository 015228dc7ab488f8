//! Terminal state guard for RAII cleanup.
//!
//! Raw mode, the alternate screen and mouse capture are switched on by
//! [`TerminalGuard::enter`] and switched off again when the guard drops,
//! including during a panic unwind.

// Rust guideline compliant 2026-02

use std::io::stdout;

use anyhow::{Context, Result};
use crossterm::{
    cursor::Show,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};

/// Guard that restores the terminal on drop.
#[derive(Debug)]
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    /// Put the terminal into TUI mode.
    pub fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        // Construct first so a failure below still restores raw mode.
        let guard = Self { _private: () };
        execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to enter alternate screen")?;
        Ok(guard)
    }
}

/// Restore the terminal. Safe to call more than once.
pub fn restore_terminal() {
    // Errors ignored: there is nothing left to report them to.
    let _ = disable_raw_mode();
    let _ = execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture, Show);
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore_terminal();
    }
}
