//! Application state for the stompscope TUI.
//!
//! - [`Focus`] - which form element receives keystrokes
//! - [`ui`] - style helpers shared by the renderer
//!
//! # Focus ring
//!
//! ```text
//! Url -> [Token] -> Channel -> Subscriptions -> Log
//!  ^                                             |
//!  +---------------------------------------------+
//! ```
//!
//! `Token` is only part of the ring while auth is enabled.

pub mod state;
pub mod ui;

pub use state::Focus;
pub use ui::{state_style, tone_style};
