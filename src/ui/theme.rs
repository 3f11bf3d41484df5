use crate::core::config::data::ThemeChoice;
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    pub choice: ThemeChoice,
    // Overall background color to paint the full frame
    pub background_color: Color,
    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_prefix_style: Style,
    pub assistant_text_style: Style,
    pub error_text_style: Style,

    // Markdown
    pub md_heading_style: Style,
    pub md_emphasis_style: Style,
    pub md_strong_style: Style,
    pub md_inline_code_style: Style,
    pub md_code_block_style: Style,
    pub md_link_style: Style,
    pub md_quote_style: Style,
    pub md_list_marker_style: Style,

    // Chrome
    pub title_style: Style,
    pub streaming_indicator_style: Style,
    pub sidebar_border_style: Style,
    pub sidebar_item_style: Style,
    pub sidebar_selected_style: Style,
    pub status_style: Style,
    pub welcome_style: Style,
    pub input_border_style: Style,
    pub input_title_style: Style,

    // Input area
    pub input_text_style: Style,
    pub input_cursor_style: Style,
    pub input_cursor_line_style: Style,

    /// syntect theme used for fenced code blocks
    pub syntax_theme: &'static str,
}

impl Theme {
    pub fn for_choice(choice: ThemeChoice) -> Self {
        match choice {
            ThemeChoice::Dark => Self::dark_default(),
            ThemeChoice::Light => Self::light(),
        }
    }

    pub fn dark_default() -> Self {
        Theme {
            choice: ThemeChoice::Dark,
            background_color: Color::Black,
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_prefix_style: Style::default()
                .fg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::White),
            error_text_style: Style::default().fg(Color::LightRed),

            md_heading_style: Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
            md_emphasis_style: Style::default().add_modifier(Modifier::ITALIC),
            md_strong_style: Style::default().add_modifier(Modifier::BOLD),
            md_inline_code_style: Style::default()
                .fg(Color::LightYellow)
                .bg(Color::Rgb(40, 40, 40)),
            md_code_block_style: Style::default().fg(Color::Gray),
            md_link_style: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::UNDERLINED),
            md_quote_style: Style::default().fg(Color::DarkGray),
            md_list_marker_style: Style::default().fg(Color::LightGreen),

            title_style: Style::default().fg(Color::Gray),
            streaming_indicator_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::SLOW_BLINK),
            sidebar_border_style: Style::default().fg(Color::DarkGray),
            sidebar_item_style: Style::default().fg(Color::Gray),
            sidebar_selected_style: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            status_style: Style::default().fg(Color::Yellow),
            welcome_style: Style::default().fg(Color::DarkGray),
            input_border_style: Style::default().fg(Color::Gray),
            input_title_style: Style::default().fg(Color::Gray),

            input_text_style: Style::default().fg(Color::White),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
            input_cursor_line_style: Style::default(),

            syntax_theme: "base16-ocean.dark",
        }
    }

    pub fn light() -> Self {
        Theme {
            choice: ThemeChoice::Light,
            background_color: Color::White,
            user_prefix_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Blue),
            assistant_prefix_style: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::Black),
            error_text_style: Style::default().fg(Color::Red),

            md_heading_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            md_emphasis_style: Style::default().add_modifier(Modifier::ITALIC),
            md_strong_style: Style::default().add_modifier(Modifier::BOLD),
            md_inline_code_style: Style::default()
                .fg(Color::Magenta)
                .bg(Color::Rgb(235, 235, 235)),
            md_code_block_style: Style::default().fg(Color::DarkGray),
            md_link_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            md_quote_style: Style::default().fg(Color::Gray),
            md_list_marker_style: Style::default().fg(Color::Green),

            title_style: Style::default().fg(Color::DarkGray),
            streaming_indicator_style: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::SLOW_BLINK),
            sidebar_border_style: Style::default().fg(Color::Gray),
            sidebar_item_style: Style::default().fg(Color::DarkGray),
            sidebar_selected_style: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            status_style: Style::default().fg(Color::Magenta),
            welcome_style: Style::default().fg(Color::Gray),
            input_border_style: Style::default().fg(Color::Black),
            input_title_style: Style::default().fg(Color::DarkGray),

            input_text_style: Style::default().fg(Color::Black),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
            input_cursor_line_style: Style::default(),

            syntax_theme: "InspiredGitHub",
        }
    }
}
