use crate::core::app::{App, AppActionContext};
use crate::core::session::Session;
use crate::ui::layout::ChatLayout;
use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

/// Shortcuts shown on the welcome screen, bound to Alt+1..Alt+3.
pub const EXAMPLE_PROMPTS: [&str; 3] = [
    "Write a bubble sort in Python",
    "Write a short essay about artificial intelligence",
    "Explain quantum computing in simple terms",
];

const IDLE_HINTS: &str =
    "Ctrl+N new • Ctrl+D delete • Alt+↑/↓ switch • Ctrl+T theme • Ctrl+B sidebar • Ctrl+C quit";
const GENERATING_HINTS: &str = "Generating… Esc cancels • Ctrl+J last question • Ctrl+C quit";

pub fn ui(f: &mut Frame, app: &App) {
    let area = f.area();
    let theme = &app.ui.theme;
    f.render_widget(
        Block::default().style(Style::default().bg(theme.background_color)),
        area,
    );

    let ctx = AppActionContext {
        term_width: area.width,
        term_height: area.height,
    };
    let layout = app.layout(ctx);

    if let Some(sidebar) = layout.sidebar {
        render_sidebar(f, app, sidebar);
    }
    render_transcript(f, app, &layout);
    render_input(f, app, layout.input);
    render_status(f, app, layout.status);
}

fn render_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.ui.theme;
    let items: Vec<ListItem> = app
        .sessions
        .sessions()
        .iter()
        .map(|session| ListItem::new(sidebar_entry(session, theme.welcome_style)))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::RIGHT)
                .border_style(theme.sidebar_border_style)
                .title(Span::styled("Chats", theme.title_style)),
        )
        .style(theme.sidebar_item_style)
        .highlight_style(theme.sidebar_selected_style)
        .highlight_symbol("› ");

    let mut state = ListState::default();
    state.select(Some(app.sessions.current_index()));
    f.render_stateful_widget(list, area, &mut state);
}

fn sidebar_entry(session: &Session, meta_style: Style) -> Vec<Line<'static>> {
    vec![
        Line::from(session.title.clone()),
        Line::from(Span::styled(
            session.created_at.format("%Y-%m-%d %H:%M").to_string(),
            meta_style,
        )),
    ]
}

fn render_transcript(f: &mut Frame, app: &App, layout: &ChatLayout) {
    let theme = &app.ui.theme;
    let area = layout.transcript;
    let title = format!(
        "parley v{} • {} • {}",
        env!("CARGO_PKG_VERSION"),
        app.sessions.current().title,
        app.endpoint()
    );
    let block = Block::default().title(Span::styled(title, theme.title_style));

    let show_welcome = app.sessions.current().messages.is_empty()
        && !app.controller.is_generating()
        && app.controller.failure().is_none();
    if show_welcome {
        let welcome = Paragraph::new(welcome_lines(app))
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(welcome, area);
        return;
    }

    // Lines are already wrapped to the viewport width.
    let transcript = Paragraph::new(app.transcript.lines.clone())
        .block(block)
        .scroll((app.scroll.offset(), 0));
    f.render_widget(transcript, area);
}

fn welcome_lines(app: &App) -> Vec<Line<'static>> {
    let theme = &app.ui.theme;
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("parley", theme.md_heading_style)),
        Line::from(Span::styled(
            "Ask anything. Replies stream in as they are written.",
            theme.welcome_style,
        )),
        Line::from(""),
    ];
    for (index, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("Alt+{}  ", index + 1), theme.md_list_marker_style),
            Span::styled(prompt.to_string(), theme.assistant_text_style),
        ]));
    }
    lines
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.ui.theme;
    let title = if app.controller.is_generating() {
        "Waiting for reply (Esc to cancel)"
    } else {
        "Message"
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.input_border_style)
        .title(Span::styled(title, theme.input_title_style));
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(app.ui.textarea(), inner);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.ui.theme;
    let text = match &app.ui.status {
        Some(status) => status.as_str(),
        None if app.controller.is_generating() => GENERATING_HINTS,
        None => IDLE_HINTS,
    };
    f.render_widget(
        Paragraph::new(Span::styled(text.to_string(), theme.status_style)),
        area,
    );
}
