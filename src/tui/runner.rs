//! TUI runner: owns the session manager and the UI state, runs the loop.
//!
//! Each tick:
//!
//! 1. Poll crossterm for one input event and apply the resulting action.
//! 2. Drain queued session events (bounded batch).
//! 3. Render.
//! 4. Sleep for the frame interval.

// Rust guideline compliant 2026-02

use std::io::{stdout, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::app::Focus;
use crate::client::Connector;
use crate::constants::{FRAME_RATE_DELAY, INPUT_POLL_TIMEOUT, MAX_EVENTS_PER_TICK};
use crate::session::SessionManager;

use super::actions::TuiAction;
use super::guard::TerminalGuard;
use super::input::event_to_action;
use super::render::{render, RenderContext};
use super::scroll::LogScroll;
use super::widget_state::{edit_request, FormState};

/// Interactive tester: terminal, session manager and form state.
#[derive(Debug)]
pub struct TuiRunner<B: Backend, C: Connector> {
    terminal: Terminal<B>,
    manager: SessionManager<C>,
    focus: Focus,
    form: FormState,
    scroll: LogScroll,
    quit: bool,
}

impl<B, C> TuiRunner<B, C>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
    C: Connector,
{
    /// Create a runner; the form starts with the manager's settings.
    pub fn new(terminal: Terminal<B>, manager: SessionManager<C>) -> Self {
        let settings = manager.settings();
        let form = FormState::new(&settings.url, &settings.token);
        Self {
            terminal,
            manager,
            focus: Focus::default(),
            form,
            scroll: LogScroll::new(),
            quit: false,
        }
    }

    /// Run until quit is requested or `shutdown` is raised.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<()> {
        log::info!("TuiRunner event loop starting");

        while !self.should_quit(shutdown) {
            self.poll_input()?;
            if self.should_quit(shutdown) {
                break;
            }

            self.poll_session_events();
            self.render()?;

            std::thread::sleep(FRAME_RATE_DELAY);
        }

        log::info!("TuiRunner event loop exiting");
        Ok(())
    }

    fn should_quit(&self, shutdown: &AtomicBool) -> bool {
        self.quit || shutdown.load(Ordering::SeqCst)
    }

    fn poll_input(&mut self) -> Result<()> {
        if event::poll(INPUT_POLL_TIMEOUT).context("Failed to poll terminal input")? {
            let ev = event::read().context("Failed to read terminal input")?;
            self.handle_input_event(&ev);
        }
        Ok(())
    }

    /// Handle a terminal input event.
    pub fn handle_input_event(&mut self, event: &Event) {
        let action = event_to_action(event, self.focus);
        self.handle_action(action);
    }

    /// Apply one action.
    pub fn handle_action(&mut self, action: TuiAction) {
        match action {
            TuiAction::Quit => {
                log::info!("Quit requested");
                self.quit = true;
            }
            TuiAction::Connect => self.connect(),
            TuiAction::Disconnect => {
                self.manager.disconnect();
            }
            TuiAction::ToggleAuth => {
                let settings = self.manager.settings_mut();
                settings.use_auth = !settings.use_auth;
                let use_auth = settings.use_auth;
                self.focus = self.focus.after_auth_toggle(use_auth);
            }
            TuiAction::ClearLog => {
                self.manager.clear_messages();
                self.scroll.to_bottom();
            }
            TuiAction::FocusNext => {
                self.focus = self.focus.next(self.manager.settings().use_auth);
            }
            TuiAction::FocusPrev => {
                self.focus = self.focus.prev(self.manager.settings().use_auth);
            }
            TuiAction::Submit => self.submit(),
            TuiAction::ChipPrev => self.form.chip_prev(),
            TuiAction::ChipNext => self.form.chip_next(self.manager.subscriptions().len()),
            TuiAction::RemoveChip => self.remove_selected_chip(),
            TuiAction::ScrollUp(lines) => self.scroll.up(lines),
            TuiAction::ScrollDown(lines) => self.scroll.down(lines),
            TuiAction::ScrollToTop => self.scroll.to_top(),
            TuiAction::ScrollToBottom => self.scroll.to_bottom(),
            TuiAction::None => {}
            edit => self.edit_focused(edit),
        }
    }

    fn connect(&mut self) {
        let settings = self.manager.settings_mut();
        settings.url = self.form.url.value().trim().to_string();
        settings.token = self.form.token.value().to_string();
        if !self.manager.connect() {
            log::debug!("Connect ignored while a session is active");
        }
    }

    fn submit(&mut self) {
        match self.focus {
            Focus::Url | Focus::Token => self.connect(),
            Focus::Channel => {
                if self.form.channel.value().trim().is_empty() {
                    return;
                }
                let name = self.form.channel.take();
                if !self.manager.add_subscription(&name) {
                    log::debug!("Channel {} already subscribed", name.trim());
                }
            }
            Focus::Subscriptions | Focus::Log => {}
        }
    }

    fn edit_focused(&mut self, action: TuiAction) {
        let Some(request) = edit_request(&action) else {
            return;
        };
        let field = match self.focus {
            Focus::Url => &mut self.form.url,
            Focus::Token => &mut self.form.token,
            Focus::Channel => &mut self.form.channel,
            Focus::Subscriptions | Focus::Log => return,
        };
        field.handle(request);
    }

    fn remove_selected_chip(&mut self) {
        let selected = self.form.selected_chip();
        let Some(name) = self.manager.subscriptions().as_slice().get(selected).cloned() else {
            return;
        };
        self.manager.remove_subscription(&name);
        self.form.clamp_chip(self.manager.subscriptions().len());
    }

    /// Apply queued session events. Returns how many were applied.
    pub fn poll_session_events(&mut self) -> usize {
        self.manager.drain_events(MAX_EVENTS_PER_TICK)
    }

    /// Render the current state.
    pub fn render(&mut self) -> Result<()> {
        let settings = self.manager.settings();
        let ctx = RenderContext {
            state: self.manager.state(),
            session: self.manager.session_id(),
            use_auth: settings.use_auth,
            unread: self.manager.unread(),
            subscriptions: self.manager.subscriptions().as_slice(),
            log: self.manager.log(),
            focus: self.focus,
            form: &self.form,
            scroll: &self.scroll,
        };
        let result = render(&mut self.terminal, &ctx)?;
        self.scroll.set_bounds(result.log_lines, result.log_viewport);
        Ok(())
    }

    /// Session manager.
    pub fn manager(&self) -> &SessionManager<C> {
        &self.manager
    }

    /// Mutable session manager.
    pub fn manager_mut(&mut self) -> &mut SessionManager<C> {
        &mut self.manager
    }

    /// Focused element.
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Form state.
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Log scroll state.
    pub fn scroll(&self) -> &LogScroll {
        &self.scroll
    }

    /// Terminal backend.
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// Whether quit was requested.
    pub fn is_quit(&self) -> bool {
        self.quit
    }

    /// Consume the runner, returning the manager with the latest form values
    /// applied to its settings.
    pub fn into_manager(mut self) -> SessionManager<C> {
        let settings = self.manager.settings_mut();
        settings.url = self.form.url.value().trim().to_string();
        settings.token = self.form.token.value().to_string();
        self.manager
    }
}

/// Run the interactive tester on the real terminal.
///
/// Returns the session manager so the caller can persist settings and
/// release the session.
pub fn run<C: Connector>(
    manager: SessionManager<C>,
    shutdown: &AtomicBool,
) -> Result<SessionManager<C>> {
    let guard = TerminalGuard::enter()?;
    let terminal: Terminal<CrosstermBackend<Stdout>> =
        Terminal::new(CrosstermBackend::new(stdout())).context("Failed to create terminal")?;

    let mut runner = TuiRunner::new(terminal, manager);
    let result = runner.run(shutdown);
    drop(guard);

    result.map(|()| runner.into_manager())
}
