//! TUI - Terminal User Interface.
//!
//! Terminal rendering, input handling and the event loop for the
//! interactive tester.
//!
//! # Architecture
//!
//! ```text
//! TuiRunner (main thread)
//! ├── owns: SessionManager, focus, form buffers, log scroll
//! ├── reads: crossterm events -> TuiAction
//! └── drains: session events queued by the STOMP client task
//! ```
//!
//! # Modules
//!
//! - [`actions`] - TUI action type (`TuiAction`)
//! - [`guard`] - Terminal state RAII guard
//! - [`input`] - crossterm event to action mapping
//! - [`render`] - Main rendering function
//! - [`runner`] - TuiRunner struct and event loop
//! - [`scroll`] - Log scroll state
//! - [`widget_state`] - Text input and form state

// Rust guideline compliant 2026-02

pub mod actions;
pub mod guard;
pub mod input;
pub mod render;
pub mod runner;
pub mod scroll;
pub mod widget_state;

#[doc(inline)]
pub use actions::TuiAction;
#[doc(inline)]
pub use guard::{restore_terminal, TerminalGuard};
#[doc(inline)]
pub use input::event_to_action;
#[doc(inline)]
pub use render::{render, RenderContext, RenderResult};
#[doc(inline)]
pub use runner::{run, TuiRunner};
#[doc(inline)]
pub use scroll::LogScroll;
#[doc(inline)]
pub use widget_state::{FormState, InputWidgetState};
