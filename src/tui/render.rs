//! TUI rendering.
//!
//! Rendering is decoupled from TuiRunner via `RenderContext`:
//!
//! ```text
//! TuiRunner ──builds──> RenderContext ──passed to──> render()
//! ```
//!
//! Screen layout, top to bottom:
//!
//! ```text
//! status line   (state, session, unread)
//! URL field
//! Token field   (only with auth)
//! Channel field
//! subscription chips
//! buttons       (connect / disconnect / auth)
//! message log
//! help line
//! ```

// Rust guideline compliant 2026-02

use anyhow::Result;
use ratatui::{
    backend::Backend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame, Terminal,
};

use crate::app::{state_style, tone_style, Focus};
use crate::client::ConnectionState;
use crate::session::{MessageLog, SessionId};

use super::scroll::LogScroll;
use super::widget_state::{FormState, InputWidgetState};

/// Character used to mask the token.
const MASK: char = '•';

/// Context required for rendering the TUI.
#[derive(Debug)]
pub struct RenderContext<'a> {
    // === Session State ===
    /// Connection state.
    pub state: ConnectionState,
    /// Live session id.
    pub session: Option<SessionId>,
    /// Whether the auth header is sent.
    pub use_auth: bool,
    /// Last unread count seen.
    pub unread: u64,
    /// Subscribed channels in order.
    pub subscriptions: &'a [String],
    /// Message log.
    pub log: &'a MessageLog,

    // === UI State ===
    /// Focused element.
    pub focus: Focus,
    /// Form buffers and chip selection.
    pub form: &'a FormState,
    /// Log scroll position.
    pub scroll: &'a LogScroll,
}

/// Measurements the runner feeds back into scroll state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderResult {
    /// Lines in the log content.
    pub log_lines: usize,
    /// Visible log rows.
    pub log_viewport: usize,
}

/// Render one frame.
pub fn render<B>(terminal: &mut Terminal<B>, ctx: &RenderContext<'_>) -> Result<RenderResult>
where
    B: Backend,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let mut result = RenderResult::default();
    terminal.draw(|f| result = render_frame(f, ctx))?;
    Ok(result)
}

fn render_frame(f: &mut Frame, ctx: &RenderContext<'_>) -> RenderResult {
    let mut constraints = vec![Constraint::Length(1), Constraint::Length(3)];
    if ctx.use_auth {
        constraints.push(Constraint::Length(3));
    }
    constraints.extend([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ]);
    let chunks = Layout::vertical(constraints).split(f.area());
    let mut areas = chunks.iter().copied();
    let mut next_area = || areas.next().unwrap_or_default();

    render_status(f, next_area(), ctx);
    render_input(
        f,
        next_area(),
        " URL ",
        ctx.form.url.value().to_string(),
        &ctx.form.url,
        ctx.focus == Focus::Url,
    );
    if ctx.use_auth {
        let masked: String = ctx.form.token.value().chars().map(|_| MASK).collect();
        render_input(
            f,
            next_area(),
            " Token ",
            masked,
            &ctx.form.token,
            ctx.focus == Focus::Token,
        );
    }
    render_input(
        f,
        next_area(),
        " Channel (Enter to add) ",
        ctx.form.channel.value().to_string(),
        &ctx.form.channel,
        ctx.focus == Focus::Channel,
    );
    render_chips(f, next_area(), ctx);
    render_buttons(f, next_area(), ctx);
    let result = render_log(f, next_area(), ctx);
    render_help(f, next_area(), ctx);
    result
}

fn focus_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

fn render_status(f: &mut Frame, area: Rect, ctx: &RenderContext<'_>) {
    let mut spans = vec![
        Span::styled("stompscope ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!("● {}", ctx.state), state_style(ctx.state)),
    ];
    if let Some(session) = ctx.session {
        spans.push(Span::raw(format!("  session {session}")));
    }
    if ctx.unread > 0 {
        spans.push(Span::styled(
            format!("  Unread: {}", ctx.unread),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_input(
    f: &mut Frame,
    area: Rect,
    title: &str,
    shown: String,
    state: &InputWidgetState,
    focused: bool,
) {
    let width = usize::from(area.width.saturating_sub(2));
    let scroll = state.visual_scroll(width);
    let block = Block::bordered()
        .title(title)
        .border_style(focus_border(focused));
    f.render_widget(
        Paragraph::new(shown).scroll((0, to_u16(scroll))).block(block),
        area,
    );

    if focused {
        let x = area.x + 1 + to_u16(state.visual_cursor().saturating_sub(scroll));
        f.set_cursor_position((x, area.y + 1));
    }
}

fn render_chips(f: &mut Frame, area: Rect, ctx: &RenderContext<'_>) {
    let focused = ctx.focus == Focus::Subscriptions;
    let block = Block::bordered()
        .title(" Subscriptions ")
        .border_style(focus_border(focused));

    let line = if ctx.subscriptions.is_empty() {
        Line::from(Span::styled("(none)", Style::default().fg(Color::DarkGray)))
    } else {
        let selected = ctx.form.selected_chip();
        let mut spans = Vec::with_capacity(ctx.subscriptions.len() * 2);
        for (i, channel) in ctx.subscriptions.iter().enumerate() {
            let style = if focused && i == selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default().fg(Color::Cyan)
            };
            spans.push(Span::styled(format!("[{channel} ×]"), style));
            spans.push(Span::raw(" "));
        }
        Line::from(spans)
    };
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn render_buttons(f: &mut Frame, area: Rect, ctx: &RenderContext<'_>) {
    let disabled = Style::default().fg(Color::DarkGray);
    let connect = if ctx.state.can_connect() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        disabled
    };
    let disconnect = if ctx.state.can_disconnect() {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        disabled
    };
    let auth = if ctx.use_auth { "[x]" } else { "[ ]" };

    let line = Line::from(vec![
        Span::styled("[ Connect ^O ]", connect),
        Span::raw(" "),
        Span::styled("[ Disconnect ^D ]", disconnect),
        Span::raw("  "),
        Span::raw(format!("{auth} Use auth ^A")),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Split `text` into rows of at most `width` characters.
fn wrap_row(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || width == 0 {
        return vec![text.to_string()];
    }
    chars.chunks(width).map(|row| row.iter().collect()).collect()
}

/// Log lines for every entry, wrapped to `width`: `KIND: payload`,
/// continuation lines indented.
fn log_lines(log: &MessageLog, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(log.len());
    for entry in log.entries() {
        let style = tone_style(entry.kind().tone());
        let prefix = format!("{}: ", entry.kind());
        let prefix_len = prefix.chars().count();
        let text = entry.payload_text();
        let mut rows = text.lines();
        let first = format!("{prefix}{}", rows.next().unwrap_or_default());

        for (i, segment) in wrap_row(&first, width).into_iter().enumerate() {
            if i > 0 {
                lines.push(Line::styled(segment, style));
                continue;
            }
            // Kind label in bold, even when the label itself wraps.
            let split = segment
                .char_indices()
                .nth(prefix_len)
                .map_or(segment.len(), |(idx, _)| idx);
            let (label, rest) = segment.split_at(split);
            lines.push(Line::from(vec![
                Span::styled(label.to_string(), style.add_modifier(Modifier::BOLD)),
                Span::styled(rest.to_string(), style),
            ]));
        }
        for row in rows {
            for segment in wrap_row(&format!("  {row}"), width) {
                lines.push(Line::styled(segment, style));
            }
        }
    }
    lines
}

fn render_log(f: &mut Frame, area: Rect, ctx: &RenderContext<'_>) -> RenderResult {
    let width = usize::from(area.width.saturating_sub(2));
    let viewport = usize::from(area.height.saturating_sub(2));
    let lines = log_lines(ctx.log, width);

    let mut scroll = *ctx.scroll;
    scroll.set_bounds(lines.len(), viewport);

    let mut title = format!(" Messages ({}) ", ctx.log.len());
    if !scroll.is_following() {
        title.push_str("[scrolled, End to follow] ");
    }
    let block = Block::bordered()
        .title(title)
        .border_style(focus_border(ctx.focus == Focus::Log));

    let result = RenderResult {
        log_lines: lines.len(),
        log_viewport: viewport,
    };
    let visible: Vec<Line<'static>> = lines
        .into_iter()
        .skip(scroll.top_row())
        .take(viewport)
        .collect();
    f.render_widget(Paragraph::new(visible).block(block), area);
    result
}

fn render_help(f: &mut Frame, area: Rect, ctx: &RenderContext<'_>) {
    let line = Line::from(vec![
        Span::styled(
            format!("[{}] ", ctx.focus.display_name()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            "Tab focus  ^O connect  ^D disconnect  ^A auth  ^L clear  ^Q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{EntryKind, MessageEntry};
    use ratatui::backend::TestBackend;
    use serde_json::json;

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = usize::from(buffer.area.width);
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    struct Fixture {
        log: MessageLog,
        subscriptions: Vec<String>,
        form: FormState,
        scroll: LogScroll,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                log: MessageLog::new(),
                subscriptions: vec!["/queue/a".to_string(), "/topic/b".to_string()],
                form: FormState::new("ws://localhost:61614/stomp", "secret"),
                scroll: LogScroll::new(),
            }
        }

        fn ctx(&self, state: ConnectionState, use_auth: bool, unread: u64) -> RenderContext<'_> {
            RenderContext {
                state,
                session: None,
                use_auth,
                unread,
                subscriptions: &self.subscriptions,
                log: &self.log,
                focus: Focus::Url,
                form: &self.form,
                scroll: &self.scroll,
            }
        }
    }

    fn draw(ctx: &RenderContext<'_>) -> (String, RenderResult) {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        let result = render(&mut terminal, ctx).unwrap();
        (screen(&terminal), result)
    }

    #[test]
    fn test_renders_form_and_chips() {
        let fixture = Fixture::new();
        let (text, _) = draw(&fixture.ctx(ConnectionState::Disconnected, false, 0));

        assert!(text.contains("ws://localhost:61614/stomp"));
        assert!(text.contains("[/queue/a ×]"));
        assert!(text.contains("[/topic/b ×]"));
        assert!(text.contains("disconnected"));
        assert!(!text.contains("Token"));
        assert!(!text.contains("Unread"));
    }

    #[test]
    fn test_token_is_masked_when_auth_enabled() {
        let fixture = Fixture::new();
        let (text, _) = draw(&fixture.ctx(ConnectionState::Disconnected, true, 0));

        assert!(text.contains("Token"));
        assert!(text.contains("••••••"));
        assert!(!text.contains("secret"));
        assert!(text.contains("[x] Use auth"));
    }

    #[test]
    fn test_unread_shown_only_when_positive() {
        let fixture = Fixture::new();
        let (text, _) = draw(&fixture.ctx(ConnectionState::Connected, false, 3));
        assert!(text.contains("Unread: 3"));
    }

    #[test]
    fn test_log_entries_rendered_with_kind() {
        let mut fixture = Fixture::new();
        fixture.log.push(MessageEntry::log("WebSocket closed"));
        fixture.log.push(MessageEntry::new(
            EntryKind::Channel("/queue/a".into()),
            json!({"unreadCount": 3}),
        ));
        let (text, result) = draw(&fixture.ctx(ConnectionState::Connected, false, 3));

        assert!(text.contains("LOG: WebSocket closed"));
        assert!(text.contains("channel:/queue/a: {"));
        assert!(text.contains("\"unreadCount\": 3"));
        assert_eq!(result.log_lines, 4);
        assert!(result.log_viewport > 0);
    }

    #[test]
    fn test_log_lines_styles_by_tone() {
        let mut log = MessageLog::new();
        log.push(MessageEntry::new(EntryKind::Error, json!("boom")));
        let lines = log_lines(&log, 78);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].spans[1].style.fg, Some(Color::Red));
    }

    #[test]
    fn test_wrap_row() {
        assert_eq!(wrap_row("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(wrap_row("", 3), vec![""]);
        assert_eq!(wrap_row("ab", 0), vec!["ab"]);
    }

    #[test]
    fn test_long_log_line_wraps_instead_of_clipping() {
        let mut fixture = Fixture::new();
        let long = format!("{}TAIL-MARK", "x".repeat(140));
        fixture.log.push(MessageEntry::log(long));
        let (text, result) = draw(&fixture.ctx(ConnectionState::Connected, false, 0));

        // "LOG: " + 149 chars over a 78-column panel.
        assert_eq!(result.log_lines, 2);
        assert!(text.contains("TAIL-MARK"));
    }

    #[test]
    fn test_follow_shows_newest_entry_in_very_long_log() {
        let mut fixture = Fixture::new();
        for i in 0..70_000 {
            fixture.log.push(MessageEntry::log(format!("line {i}")));
        }
        fixture.log.push(MessageEntry::log("NEWEST-ENTRY"));
        let (text, result) = draw(&fixture.ctx(ConnectionState::Connected, false, 0));

        assert_eq!(result.log_lines, 70_001);
        assert!(text.contains("LOG: NEWEST-ENTRY"));
        assert!(text.contains("LOG: line 69999"));
    }
}
