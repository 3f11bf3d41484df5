//! Keybinding table for the chat view.

pub mod registry;

pub use registry::{KeyContext, KeyPattern, KeyResult, ModeAwareRegistry};

use crate::core::app::{App, AppAction, AppActionContext};
use crate::core::scroll::ViewportEvent;
use crate::ui::renderer::EXAMPLE_PROMPTS;
use ratatui::crossterm::event::{KeyCode, KeyEvent};
use registry::ModeAwareBuilder;

fn page_size(app: &App, ctx: AppActionContext) -> u16 {
    let (_, height) = app.layout(ctx).transcript_viewport();
    height.saturating_sub(1).max(1)
}

fn scroll(event: ViewportEvent) -> KeyResult {
    AppAction::Scroll(event).into()
}

fn example_prompt(index: usize) -> KeyResult {
    match EXAMPLE_PROMPTS.get(index) {
        Some(text) => AppAction::SubmitPrompt {
            text: (*text).to_string(),
        }
        .into(),
        None => KeyResult::NotHandled,
    }
}

/// Build the registry with every chat view binding
pub fn build_mode_aware_registry() -> ModeAwareRegistry {
    use KeyContext::{ConfirmDelete, Typing};

    ModeAwareBuilder::new()
        .register_for_context(Typing, KeyPattern::simple(KeyCode::Enter), |_, _, _| {
            AppAction::SubmitInput.into()
        })
        .register_for_context(Typing, KeyPattern::alt(KeyCode::Enter), |_, _, _| {
            KeyResult::Newline
        })
        .register_for_context(Typing, KeyPattern::simple(KeyCode::Esc), |app, _, _| {
            if app.controller.is_generating() {
                AppAction::CancelStreaming.into()
            } else {
                AppAction::ClearStatus.into()
            }
        })
        .register_for_context(Typing, KeyPattern::ctrl(KeyCode::Char('n')), |_, _, _| {
            AppAction::NewChat.into()
        })
        .register_for_context(Typing, KeyPattern::ctrl(KeyCode::Char('d')), |_, _, _| {
            AppAction::RequestDelete.into()
        })
        .register_for_context(Typing, KeyPattern::alt(KeyCode::Up), |_, _, _| {
            AppAction::SwitchSession { step: -1 }.into()
        })
        .register_for_context(Typing, KeyPattern::alt(KeyCode::Down), |_, _, _| {
            AppAction::SwitchSession { step: 1 }.into()
        })
        .register_for_context(Typing, KeyPattern::ctrl(KeyCode::Char('t')), |_, _, _| {
            AppAction::ToggleTheme.into()
        })
        .register_for_context(Typing, KeyPattern::ctrl(KeyCode::Char('b')), |_, _, _| {
            AppAction::ToggleSidebar.into()
        })
        .register_for_context(Typing, KeyPattern::ctrl(KeyCode::Char('j')), |_, _, _| {
            AppAction::JumpToLastQuestion.into()
        })
        .register_for_context(Typing, KeyPattern::alt(KeyCode::Char('1')), |_, _, _| {
            example_prompt(0)
        })
        .register_for_context(Typing, KeyPattern::alt(KeyCode::Char('2')), |_, _, _| {
            example_prompt(1)
        })
        .register_for_context(Typing, KeyPattern::alt(KeyCode::Char('3')), |_, _, _| {
            example_prompt(2)
        })
        .register_for_context(Typing, KeyPattern::simple(KeyCode::Up), |_, _, _| {
            scroll(ViewportEvent::LineUp)
        })
        .register_for_context(Typing, KeyPattern::simple(KeyCode::Down), |_, _, _| {
            scroll(ViewportEvent::LineDown)
        })
        .register_for_context(Typing, KeyPattern::simple(KeyCode::PageUp), |app, _, ctx| {
            scroll(ViewportEvent::PageUp(page_size(app, ctx)))
        })
        .register_for_context(
            Typing,
            KeyPattern::simple(KeyCode::PageDown),
            |app, _, ctx| scroll(ViewportEvent::PageDown(page_size(app, ctx))),
        )
        .register_for_context(Typing, KeyPattern::simple(KeyCode::Home), |_, _, _| {
            scroll(ViewportEvent::Top)
        })
        .register_for_context(Typing, KeyPattern::simple(KeyCode::End), |_, _, _| {
            scroll(ViewportEvent::Bottom)
        })
        .register_for_context(Typing, KeyPattern::ctrl(KeyCode::Char('c')), |_, _, _| {
            AppAction::Quit.into()
        })
        .fallback(Typing, |_, _, _| KeyResult::Edit)
        .register_for_context(
            ConfirmDelete,
            KeyPattern::simple(KeyCode::Char('y')),
            |_, _, _| AppAction::ConfirmDelete.into(),
        )
        .register_for_context(
            ConfirmDelete,
            KeyPattern::simple(KeyCode::Char('Y')),
            |_, _, _| AppAction::ConfirmDelete.into(),
        )
        .register_for_context(
            ConfirmDelete,
            KeyPattern::ctrl(KeyCode::Char('c')),
            |_, _, _| AppAction::Quit.into(),
        )
        .fallback(ConfirmDelete, |_, _, _| AppAction::DismissDelete.into())
        .build()
}

/// Resolve a key press against the registry.
pub fn resolve_key(
    registry: &ModeAwareRegistry,
    app: &App,
    key: &KeyEvent,
    ctx: AppActionContext,
) -> KeyResult {
    registry.handle_key_event(app, key, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::apply_action;
    use crate::utils::test_utils::{create_test_app, default_ctx};
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn enter_sends_and_alt_enter_breaks_the_line() {
        let registry = build_mode_aware_registry();
        let app = create_test_app();
        let ctx = default_ctx();
        assert_eq!(
            resolve_key(&registry, &app, &key(KeyCode::Enter, KeyModifiers::NONE), ctx),
            KeyResult::Dispatch(vec![AppAction::SubmitInput])
        );
        assert_eq!(
            resolve_key(&registry, &app, &key(KeyCode::Enter, KeyModifiers::ALT), ctx),
            KeyResult::Newline
        );
        assert_eq!(
            resolve_key(&registry, &app, &key(KeyCode::Char('x'), KeyModifiers::NONE), ctx),
            KeyResult::Edit
        );
    }

    #[test]
    fn escape_cancels_only_while_generating() {
        let registry = build_mode_aware_registry();
        let mut app = create_test_app();
        let ctx = default_ctx();
        let esc = key(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(
            resolve_key(&registry, &app, &esc, ctx),
            KeyResult::Dispatch(vec![AppAction::ClearStatus])
        );

        app.ui.set_input_text("hello");
        apply_action(&mut app, AppAction::SubmitInput, ctx);
        assert_eq!(
            resolve_key(&registry, &app, &esc, ctx),
            KeyResult::Dispatch(vec![AppAction::CancelStreaming])
        );
    }

    #[test]
    fn example_shortcuts_submit_prompts() {
        let registry = build_mode_aware_registry();
        let app = create_test_app();
        assert_eq!(
            resolve_key(
                &registry,
                &app,
                &key(KeyCode::Char('2'), KeyModifiers::ALT),
                default_ctx()
            ),
            KeyResult::Dispatch(vec![AppAction::SubmitPrompt {
                text: EXAMPLE_PROMPTS[1].to_string()
            }])
        );
    }

    #[test]
    fn delete_confirmation_only_accepts_yes() {
        let registry = build_mode_aware_registry();
        let mut app = create_test_app();
        let ctx = default_ctx();
        apply_action(&mut app, AppAction::RequestDelete, ctx);

        assert_eq!(
            resolve_key(&registry, &app, &key(KeyCode::Char('y'), KeyModifiers::NONE), ctx),
            KeyResult::Dispatch(vec![AppAction::ConfirmDelete])
        );
        assert_eq!(
            resolve_key(&registry, &app, &key(KeyCode::Enter, KeyModifiers::NONE), ctx),
            KeyResult::Dispatch(vec![AppAction::DismissDelete])
        );
    }

    #[test]
    fn page_keys_move_by_viewport_height() {
        let registry = build_mode_aware_registry();
        let app = create_test_app();
        let ctx = default_ctx();
        let expected = page_size(&app, ctx);
        assert!(expected > 1);
        assert_eq!(
            resolve_key(&registry, &app, &key(KeyCode::PageUp, KeyModifiers::NONE), ctx),
            KeyResult::Dispatch(vec![AppAction::Scroll(ViewportEvent::PageUp(expected))])
        );
    }
}
