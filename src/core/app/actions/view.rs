use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::config::data::Config;
use crate::core::scroll::ViewportEvent;
use crate::ui::theme::Theme;
use tracing::warn;

pub(super) fn handle_view_action(
    app: &mut App,
    action: AppAction,
    ctx: AppActionContext,
) -> Option<AppCommand> {
    match action {
        AppAction::InsertIntoInput { text } => {
            app.ui.apply_textarea_edit(|ta| {
                ta.insert_str(&text);
            });
        }
        AppAction::ToggleTheme => toggle_theme(app),
        AppAction::ToggleSidebar => {
            app.ui.sidebar_visible = !app.ui.sidebar_visible;
        }
        AppAction::Scroll(event) => app.scroll.apply(event),
        AppAction::JumpToLastQuestion => {
            // Make sure the line index matches the current layout.
            app.refresh_transcript(ctx);
            match app.transcript.last_user_line {
                Some(line) => {
                    let offset = line.min(u16::MAX as usize) as u16;
                    app.scroll.apply(ViewportEvent::JumpTo(offset));
                }
                None => app.ui.set_status("No question to jump to yet"),
            }
        }
        AppAction::SetStatus { message } => app.ui.set_status(message),
        AppAction::ClearStatus => app.ui.status = None,
        AppAction::Quit => {
            let result = app
                .controller
                .cancel(&app.sessions, app.store.as_ref(), &app.pipeline);
            if let Err(err) = result {
                warn!(error = %err, "failed to save sessions on exit");
            }
            app.ui.exit_requested = true;
        }
        _ => {}
    }
    None
}

fn toggle_theme(app: &mut App) {
    let choice = app.ui.theme.choice.toggled();
    app.apply_theme(Theme::for_choice(choice));

    if let Some(path) = app.config_path().cloned() {
        if let Err(err) = Config::update_at(&path, |config| config.theme = Some(choice)) {
            warn!(error = %err, "failed to persist theme");
            app.ui.set_status(err.to_string());
        }
    }
}
