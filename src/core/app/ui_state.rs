use crate::ui::theme::Theme;
use ratatui::style::Style;
use tui_textarea::{CursorMove, TextArea};

pub const MAX_INPUT_LINES: usize = 6;

/// Presentation state owned by the chat view.
pub struct UiState {
    pub theme: Theme,
    pub syntax_enabled: bool,
    pub sidebar_visible: bool,
    pub status: Option<String>,
    /// Session awaiting a yes/no delete confirmation.
    pub pending_delete: Option<String>,
    pub exit_requested: bool,
    textarea: TextArea<'static>,
}

impl UiState {
    pub fn new(theme: Theme, syntax_enabled: bool) -> Self {
        let mut ui = Self {
            theme,
            syntax_enabled,
            sidebar_visible: true,
            status: None,
            pending_delete: None,
            exit_requested: false,
            textarea: TextArea::default(),
        };
        ui.configure_textarea();
        ui
    }

    pub(crate) fn configure_textarea(&mut self) {
        let textarea_style = self
            .theme
            .input_text_style
            .patch(Style::default().bg(self.theme.background_color));
        self.textarea.set_style(textarea_style);
        self.textarea
            .set_cursor_style(self.theme.input_cursor_style);
        self.textarea
            .set_cursor_line_style(self.theme.input_cursor_line_style);
        self.textarea
            .set_placeholder_text("Type a message. Enter sends, Alt+Enter adds a line");
        self.textarea
            .set_placeholder_style(self.theme.welcome_style);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.configure_textarea();
    }

    pub fn textarea(&self) -> &TextArea<'static> {
        &self.textarea
    }

    pub fn input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn input_line_count(&self) -> usize {
        self.textarea.lines().len().clamp(1, MAX_INPUT_LINES)
    }

    pub fn set_input_text(&mut self, text: &str) {
        let lines: Vec<String> = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        self.textarea = TextArea::from(lines);
        self.textarea.move_cursor(CursorMove::Bottom);
        self.textarea.move_cursor(CursorMove::End);
        self.configure_textarea();
    }

    pub fn clear_input(&mut self) {
        self.set_input_text("");
    }

    pub fn apply_textarea_edit<F>(&mut self, f: F)
    where
        F: FnOnce(&mut TextArea<'static>),
    {
        f(&mut self.textarea);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_text_round_trips_multiline() {
        let mut ui = UiState::new(Theme::dark_default(), true);
        ui.set_input_text("first\nsecond");
        assert_eq!(ui.input_text(), "first\nsecond");
        assert_eq!(ui.input_line_count(), 2);
        assert_eq!(ui.textarea().cursor(), (1, 6));

        ui.clear_input();
        assert_eq!(ui.input_text(), "");
        assert_eq!(ui.input_line_count(), 1);
    }
}
