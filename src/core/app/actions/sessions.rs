use super::{App, AppAction, AppCommand};
use tracing::warn;

const BUSY_NOTICE: &str = "Wait for the reply to finish (Esc cancels)";

fn persist(app: &mut App) {
    if let Err(err) = app.sessions.persist(app.store.as_ref()) {
        warn!(error = %err, "failed to save sessions");
        app.ui.set_status(err.to_string());
    }
}

/// Session changes are refused while a reply is in flight.
fn guard_idle(app: &mut App) -> bool {
    if app.controller.is_generating() {
        app.ui.set_status(BUSY_NOTICE);
        return false;
    }
    true
}

fn after_session_change(app: &mut App) {
    app.controller.dismiss_failure();
    app.ui.pending_delete = None;
    app.scroll.reset();
}

pub(super) fn handle_session_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::NewChat => {
            if guard_idle(app) {
                app.sessions.new_chat();
                after_session_change(app);
                app.ui.status = None;
                persist(app);
            }
        }
        AppAction::SwitchSession { step } => {
            if guard_idle(app) {
                let target = app.sessions.neighbor(step).to_string();
                if target != app.sessions.current_id() {
                    if let Err(err) = app.sessions.switch_to(&target) {
                        app.ui.set_status(err.to_string());
                    }
                    after_session_change(app);
                }
            }
        }
        AppAction::RequestDelete => {
            if guard_idle(app) {
                let current = app.sessions.current();
                app.ui.set_status(format!("Delete \"{}\"? (y/n)", current.title));
                app.ui.pending_delete = Some(current.id.clone());
            }
        }
        AppAction::ConfirmDelete => {
            if let Some(id) = app.ui.pending_delete.take() {
                if !guard_idle(app) {
                    return None;
                }
                match app.sessions.delete(&id) {
                    Ok(removed) => {
                        after_session_change(app);
                        app.ui.set_status(format!("Deleted \"{}\"", removed.title));
                        persist(app);
                    }
                    Err(err) => app.ui.set_status(err.to_string()),
                }
            }
        }
        AppAction::DismissDelete => {
            if app.ui.pending_delete.take().is_some() {
                app.ui.status = None;
            }
        }
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::super::apply_action;
    use super::*;
    use crate::core::session::Session;
    use crate::utils::test_utils::{create_test_app_with_sessions, default_ctx};

    #[test]
    fn new_chat_goes_first_and_is_persisted() {
        let (mut app, store) = create_test_app_with_sessions(vec![Session::with_id("old")]);
        apply_action(&mut app, AppAction::NewChat, default_ctx());

        assert_eq!(app.sessions.len(), 2);
        assert_eq!(app.sessions.sessions()[0].id, app.sessions.current_id());
        assert_eq!(store.saved().len(), 2);
    }

    #[test]
    fn session_changes_are_refused_while_generating() {
        let (mut app, _store) =
            create_test_app_with_sessions(vec![Session::with_id("a"), Session::with_id("b")]);
        let ctx = default_ctx();
        app.ui.set_input_text("question");
        assert!(apply_action(&mut app, AppAction::SubmitInput, ctx).is_some());

        apply_action(&mut app, AppAction::NewChat, ctx);
        apply_action(&mut app, AppAction::SwitchSession { step: 1 }, ctx);
        apply_action(&mut app, AppAction::RequestDelete, ctx);

        assert_eq!(app.sessions.len(), 2);
        assert_eq!(app.sessions.current_id(), "a");
        assert!(app.ui.pending_delete.is_none());
        assert_eq!(app.ui.status.as_deref(), Some(BUSY_NOTICE));
    }

    #[test]
    fn switching_moves_through_the_list() {
        let (mut app, _store) =
            create_test_app_with_sessions(vec![Session::with_id("a"), Session::with_id("b")]);
        let ctx = default_ctx();
        apply_action(&mut app, AppAction::SwitchSession { step: 1 }, ctx);
        assert_eq!(app.sessions.current_id(), "b");
        apply_action(&mut app, AppAction::SwitchSession { step: 1 }, ctx);
        assert_eq!(app.sessions.current_id(), "b");
        apply_action(&mut app, AppAction::SwitchSession { step: -1 }, ctx);
        assert_eq!(app.sessions.current_id(), "a");
    }

    #[test]
    fn delete_requires_confirmation() {
        let (mut app, store) =
            create_test_app_with_sessions(vec![Session::with_id("a"), Session::with_id("b")]);
        let ctx = default_ctx();

        apply_action(&mut app, AppAction::RequestDelete, ctx);
        assert_eq!(app.ui.pending_delete.as_deref(), Some("a"));
        apply_action(&mut app, AppAction::DismissDelete, ctx);
        assert_eq!(app.sessions.len(), 2);

        apply_action(&mut app, AppAction::RequestDelete, ctx);
        apply_action(&mut app, AppAction::ConfirmDelete, ctx);
        assert_eq!(app.sessions.len(), 1);
        assert_eq!(app.sessions.current_id(), "b");
        assert_eq!(store.saved().len(), 1);
    }

    #[test]
    fn deleting_the_last_session_starts_a_fresh_one() {
        let (mut app, _store) = create_test_app_with_sessions(vec![Session::with_id("only")]);
        let ctx = default_ctx();
        apply_action(&mut app, AppAction::RequestDelete, ctx);
        apply_action(&mut app, AppAction::ConfirmDelete, ctx);

        assert_eq!(app.sessions.len(), 1);
        assert_ne!(app.sessions.current_id(), "only");
    }
}
