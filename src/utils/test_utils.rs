use crate::core::app::{App, AppActionContext, AppInit};
use crate::core::config::data::Config;
use crate::core::render::RenderPipeline;
use crate::core::session::{Session, SessionList, SessionStore, SessionStoreError};
use crate::ui::markdown::TerminalMarkdown;
use crate::ui::theme::Theme;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// In-memory store whose saved snapshot can be inspected from tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    saved: Arc<Mutex<Vec<Session>>>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<Session> {
        self.saved.lock().unwrap().clone()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Vec<Session>, SessionStoreError> {
        Ok(self.saved())
    }

    fn save(&self, sessions: &[Session]) -> Result<(), SessionStoreError> {
        if self.fail_saves {
            return Err(SessionStoreError::Write {
                path: PathBuf::from("memory"),
                source: std::io::Error::other("disk full"),
            });
        }
        *self.saved.lock().unwrap() = sessions.to_vec();
        Ok(())
    }
}

/// Markdown rendering without syntax highlighting.
pub fn plain_pipeline() -> RenderPipeline {
    RenderPipeline::new(Box::new(TerminalMarkdown::new(Theme::dark_default())), None)
}

pub fn default_ctx() -> AppActionContext {
    AppActionContext {
        term_width: 80,
        term_height: 24,
    }
}

fn build_app(sessions: Vec<Session>, store: MemoryStore, config_path: Option<PathBuf>) -> App {
    let config = Config {
        syntax: Some(false),
        ..Config::default()
    };
    App::new(AppInit {
        sessions: SessionList::from_sessions(sessions),
        store: Box::new(store),
        endpoint: "http://127.0.0.1:1/chat/messages".to_string(),
        config,
        config_path,
    })
}

pub fn create_test_app() -> App {
    build_app(vec![Session::with_id("test-session")], MemoryStore::default(), None)
}

pub fn create_test_app_with_sessions(sessions: Vec<Session>) -> (App, MemoryStore) {
    let store = MemoryStore::default();
    (build_app(sessions, store.clone(), None), store)
}

pub fn create_test_app_with_config_path(path: PathBuf) -> App {
    build_app(vec![Session::with_id("test-session")], MemoryStore::default(), Some(path))
}
