//! Mode-aware keybinding registry
//!
//! Keys are looked up by exact pattern within the current context. A context
//! may also carry a fallback handler for everything it does not bind.

use crate::core::app::{App, AppAction, AppActionContext};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// Result of handling a key event
#[derive(Debug, Clone, PartialEq)]
pub enum KeyResult {
    /// Apply these actions in order
    Dispatch(Vec<AppAction>),
    /// Forward the key to the input editor
    Edit,
    /// Insert a line break into the input
    Newline,
    NotHandled,
}

impl From<AppAction> for KeyResult {
    fn from(action: AppAction) -> Self {
        KeyResult::Dispatch(vec![action])
    }
}

pub type KeyHandler = fn(&App, &KeyEvent, AppActionContext) -> KeyResult;

/// Pattern for matching key events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPattern {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyPattern {
    pub fn simple(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn alt(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::ALT,
        }
    }

    pub fn with_modifiers(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }
}

impl From<&KeyEvent> for KeyPattern {
    fn from(key: &KeyEvent) -> Self {
        Self {
            code: key.code,
            modifiers: key.modifiers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyContext {
    /// Normal typing mode
    Typing,
    /// A session delete is waiting for y/n
    ConfirmDelete,
}

impl KeyContext {
    pub fn from_app(app: &App) -> Self {
        if app.ui.pending_delete.is_some() {
            KeyContext::ConfirmDelete
        } else {
            KeyContext::Typing
        }
    }
}

#[derive(Default)]
pub struct ModeAwareRegistry {
    handlers: HashMap<KeyContext, HashMap<KeyPattern, KeyHandler>>,
    fallbacks: HashMap<KeyContext, KeyHandler>,
}

impl ModeAwareRegistry {
    pub fn register_for_context(
        &mut self,
        context: KeyContext,
        pattern: KeyPattern,
        handler: KeyHandler,
    ) {
        self.handlers
            .entry(context)
            .or_default()
            .insert(pattern, handler);
    }

    pub fn register_fallback(&mut self, context: KeyContext, handler: KeyHandler) {
        self.fallbacks.insert(context, handler);
    }

    pub fn handle_key_event(
        &self,
        app: &App,
        key: &KeyEvent,
        ctx: AppActionContext,
    ) -> KeyResult {
        let context = KeyContext::from_app(app);
        let pattern = KeyPattern::from(key);

        if let Some(handler) = self
            .handlers
            .get(&context)
            .and_then(|handlers| handlers.get(&pattern))
        {
            let result = handler(app, key, ctx);
            if result != KeyResult::NotHandled {
                return result;
            }
        }

        match self.fallbacks.get(&context) {
            Some(fallback) => fallback(app, key, ctx),
            None => KeyResult::NotHandled,
        }
    }
}

/// Builder for chaining registrations
#[derive(Default)]
pub struct ModeAwareBuilder {
    registry: ModeAwareRegistry,
}

impl ModeAwareBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_for_context(
        mut self,
        context: KeyContext,
        pattern: KeyPattern,
        handler: KeyHandler,
    ) -> Self {
        self.registry.register_for_context(context, pattern, handler);
        self
    }

    pub fn fallback(mut self, context: KeyContext, handler: KeyHandler) -> Self {
        self.registry.register_fallback(context, handler);
        self
    }

    pub fn build(self) -> ModeAwareRegistry {
        self.registry
    }
}
