//! Scroll state for the message log.
//!
//! The log follows the newest line until the user scrolls up. While
//! scrolled, the top row stays put as new entries arrive; scrolling back
//! to the bottom (or `End`) resumes following.

// Rust guideline compliant 2026-02

/// Log viewport position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogScroll {
    /// Pinned top row; `None` follows the newest line.
    anchor: Option<usize>,
    /// Largest valid top row from the last render.
    max_top: usize,
}

impl LogScroll {
    /// Follow mode.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the view follows the newest line.
    #[must_use]
    pub fn is_following(&self) -> bool {
        self.anchor.is_none()
    }

    /// Top row to draw.
    #[must_use]
    pub fn top_row(&self) -> usize {
        self.anchor.map_or(self.max_top, |top| top.min(self.max_top))
    }

    /// Record the content height and viewport height from a render pass.
    pub fn set_bounds(&mut self, total_lines: usize, viewport: usize) {
        self.max_top = total_lines.saturating_sub(viewport);
        if let Some(top) = self.anchor {
            self.anchor = Some(top.min(self.max_top));
        }
    }

    /// Scroll up by `lines`.
    pub fn up(&mut self, lines: usize) {
        self.anchor = Some(self.top_row().saturating_sub(lines));
    }

    /// Scroll down by `lines`; reaching the bottom resumes following.
    pub fn down(&mut self, lines: usize) {
        let Some(top) = self.anchor else {
            return;
        };
        let top = top.saturating_add(lines);
        self.anchor = (top < self.max_top).then_some(top);
    }

    /// Jump to the oldest line.
    pub fn to_top(&mut self) {
        self.anchor = Some(0);
    }

    /// Jump to the newest line and follow.
    pub fn to_bottom(&mut self) {
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follows_by_default() {
        let mut scroll = LogScroll::new();
        scroll.set_bounds(100, 20);
        assert!(scroll.is_following());
        assert_eq!(scroll.top_row(), 80);

        scroll.set_bounds(120, 20);
        assert_eq!(scroll.top_row(), 100);
    }

    #[test]
    fn test_scrolled_view_stays_put() {
        let mut scroll = LogScroll::new();
        scroll.set_bounds(100, 20);
        scroll.up(5);
        assert_eq!(scroll.top_row(), 75);
        assert!(!scroll.is_following());

        scroll.set_bounds(150, 20);
        assert_eq!(scroll.top_row(), 75);
    }

    #[test]
    fn test_down_to_bottom_resumes_follow() {
        let mut scroll = LogScroll::new();
        scroll.set_bounds(100, 20);
        scroll.up(10);
        scroll.down(4);
        assert_eq!(scroll.top_row(), 74);
        scroll.down(50);
        assert!(scroll.is_following());
        assert_eq!(scroll.top_row(), 80);
    }

    #[test]
    fn test_top_and_bottom() {
        let mut scroll = LogScroll::new();
        scroll.set_bounds(30, 10);
        scroll.to_top();
        assert_eq!(scroll.top_row(), 0);
        scroll.to_bottom();
        assert!(scroll.is_following());
    }

    #[test]
    fn test_short_content_never_scrolls() {
        let mut scroll = LogScroll::new();
        scroll.set_bounds(5, 10);
        scroll.up(3);
        assert_eq!(scroll.top_row(), 0);
    }

    #[test]
    fn test_cleared_log_clamps_anchor() {
        let mut scroll = LogScroll::new();
        scroll.set_bounds(100, 10);
        scroll.up(5);
        scroll.set_bounds(0, 10);
        assert_eq!(scroll.top_row(), 0);
    }
}
