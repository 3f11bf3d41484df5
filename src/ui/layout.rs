use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub const SIDEBAR_WIDTH: u16 = 28;
/// Below this terminal width the sidebar is hidden even when toggled on.
pub const SIDEBAR_MIN_TERMINAL_WIDTH: u16 = 60;

/// Screen regions of the chat view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatLayout {
    pub sidebar: Option<Rect>,
    /// Transcript area including its one-line title.
    pub transcript: Rect,
    pub input: Rect,
    pub status: Rect,
}

impl ChatLayout {
    pub fn compute(area: Rect, sidebar_visible: bool, input_lines: usize) -> Self {
        let show_sidebar = sidebar_visible && area.width >= SIDEBAR_MIN_TERMINAL_WIDTH;
        let (sidebar, main) = if show_sidebar {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
                .split(area);
            (Some(columns[0]), columns[1])
        } else {
            (None, area)
        };

        let input_height = input_lines as u16 + 2; // +2 for borders
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(input_height),
                Constraint::Length(1),
            ])
            .split(main);

        Self {
            sidebar,
            transcript: rows[0],
            input: rows[1],
            status: rows[2],
        }
    }

    pub fn from_terminal_size(
        width: u16,
        height: u16,
        sidebar_visible: bool,
        input_lines: usize,
    ) -> Self {
        Self::compute(Rect::new(0, 0, width, height), sidebar_visible, input_lines)
    }

    /// Width and height available to transcript lines (below the title row).
    pub fn transcript_viewport(&self) -> (u16, u16) {
        (
            self.transcript.width,
            self.transcript.height.saturating_sub(1),
        )
    }
}
