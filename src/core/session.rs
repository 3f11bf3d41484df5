//! Conversation threads and their on-disk store.
//!
//! Sessions are kept most-recent-first: a new chat is inserted at the front and
//! the list is persisted in that order.

use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::core::config::data::path_display;
use crate::core::config::io::write_dir;
use crate::core::message::{Message, Role};

pub const DEFAULT_TITLE: &str = "New Chat";
const TITLE_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(new_session_id())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: default_title(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// Append a message. The first user message names the session.
    pub fn push(&mut self, message: Message) {
        let names_session = message.role == Role::User && self.messages.is_empty();
        if names_session {
            self.title = derive_title(&message.content);
        }
        self.messages.push(message);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// First 20 characters of the message, with an ellipsis when truncated.
pub fn derive_title(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Random version 4 UUID, used as the server-side thread id.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Errors raised by the session list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    UnknownSession(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UnknownSession(id) => write!(f, "No session with id {id}"),
        }
    }
}

impl StdError for SessionError {}

/// Errors that can occur when reading or writing the session file.
#[derive(Debug)]
pub enum SessionStoreError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    Serialize(serde_json::Error),
}

impl fmt::Display for SessionStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStoreError::Read { path, source } => {
                write!(f, "Failed to read sessions at {}: {}", path_display(path), source)
            }
            SessionStoreError::Parse { path, source } => {
                write!(f, "Failed to parse sessions at {}: {}", path_display(path), source)
            }
            SessionStoreError::Write { path, source } => {
                write!(f, "Failed to save sessions to {}: {}", path_display(path), source)
            }
            SessionStoreError::Serialize(source) => {
                write!(f, "Failed to serialize sessions: {source}")
            }
        }
    }
}

impl StdError for SessionStoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SessionStoreError::Read { source, .. } => Some(source),
            SessionStoreError::Parse { source, .. } => Some(source),
            SessionStoreError::Write { source, .. } => Some(source),
            SessionStoreError::Serialize(source) => Some(source),
        }
    }
}

pub trait SessionStore {
    fn load(&self) -> Result<Vec<Session>, SessionStoreError>;
    fn save(&self, sessions: &[Session]) -> Result<(), SessionStoreError>;
}

/// JSON file holding every session, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "parley", "parley")
            .map(|dirs| dirs.data_dir().join("sessions.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_err(&self, source: std::io::Error) -> SessionStoreError {
        SessionStoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Vec<Session>, SessionStoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|source| SessionStoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents).map_err(|source| SessionStoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, sessions: &[Session]) -> Result<(), SessionStoreError> {
        let dir = write_dir(&self.path);
        fs::create_dir_all(dir).map_err(|e| self.write_err(e))?;

        let contents =
            serde_json::to_string_pretty(sessions).map_err(SessionStoreError::Serialize)?;
        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| self.write_err(e))?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| self.write_err(e))?;
        temp_file
            .as_file_mut()
            .sync_all()
            .map_err(|e| self.write_err(e))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| self.write_err(e.error))?;
        Ok(())
    }
}

/// The ordered session list plus the current selection. The current id always
/// names a session in the list.
#[derive(Debug, Clone)]
pub struct SessionList {
    sessions: Vec<Session>,
    current: String,
}

impl SessionList {
    /// Select the most recent session, or start a fresh one when there is none.
    pub fn from_sessions(mut sessions: Vec<Session>) -> Self {
        if sessions.is_empty() {
            sessions.push(Session::new());
        }
        let current = sessions[0].id.clone();
        Self { sessions, current }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn current_id(&self) -> &str {
        &self.current
    }

    pub fn current(&self) -> &Session {
        let index = self.current_index();
        &self.sessions[index]
    }

    pub fn current_index(&self) -> usize {
        self.position(&self.current).unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    pub fn new_chat(&mut self) -> &str {
        let session = Session::new();
        self.current = session.id.clone();
        self.sessions.insert(0, session);
        &self.current
    }

    pub fn switch_to(&mut self, id: &str) -> Result<(), SessionError> {
        if self.position(id).is_none() {
            return Err(SessionError::UnknownSession(id.to_string()));
        }
        self.current = id.to_string();
        Ok(())
    }

    /// Id of the session `step` places away from the current one, clamped to
    /// the list bounds.
    pub fn neighbor(&self, step: isize) -> &str {
        let last = self.sessions.len().saturating_sub(1) as isize;
        let index = (self.current_index() as isize + step).clamp(0, last) as usize;
        &self.sessions[index].id
    }

    /// Remove a session. Deleting the current one selects the next most recent
    /// session, or a fresh chat if the list became empty.
    pub fn delete(&mut self, id: &str) -> Result<Session, SessionError> {
        let index = self
            .position(id)
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;
        let removed = self.sessions.remove(index);

        if removed.id == self.current {
            if self.sessions.is_empty() {
                self.sessions.push(Session::new());
            }
            let next = index.min(self.sessions.len() - 1);
            self.current = self.sessions[next].id.clone();
        }
        Ok(removed)
    }

    pub fn append_to(&mut self, id: &str, message: Message) -> Result<(), SessionError> {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| SessionError::UnknownSession(id.to_string()))?;
        session.push(message);
        Ok(())
    }

    pub fn append_to_current(&mut self, message: Message) {
        let index = self.current_index();
        self.sessions[index].push(message);
    }

    pub fn persist(&self, store: &dyn SessionStore) -> Result<(), SessionStoreError> {
        store.save(&self.sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn title_comes_from_first_user_message() {
        let mut session = Session::with_id("a");
        assert_eq!(session.title, DEFAULT_TITLE);

        session.push(Message::user("Write a bubble sort in Python please"));
        assert_eq!(session.title, "Write a bubble sort ...");

        session.push(Message::user("and explain it"));
        assert_eq!(session.title, "Write a bubble sort ...");
    }

    #[test]
    fn short_titles_are_not_ellipsized() {
        assert_eq!(derive_title("Hello"), "Hello");
        assert_eq!(derive_title("exactly twenty chars"), "exactly twenty chars");
        assert_eq!(derive_title("量子计算是什么？用简单易懂的语言解释一下好吗"), "量子计算是什么？用简单易懂的语言解释一下...");
    }

    #[test]
    fn session_ids_are_v4_uuids() {
        let id = new_session_id();
        let parsed = Uuid::parse_str(&id).expect("valid uuid");
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(parsed.hyphenated().to_string(), id);
        assert_ne!(id, new_session_id());
    }

    #[test]
    fn empty_history_starts_a_new_chat() {
        let list = SessionList::from_sessions(Vec::new());
        assert_eq!(list.len(), 1);
        assert_eq!(list.current().title, DEFAULT_TITLE);
    }

    #[test]
    fn new_chat_is_inserted_first_and_selected() {
        let mut list = SessionList::from_sessions(vec![Session::with_id("old")]);
        let id = list.new_chat().to_string();
        assert_eq!(list.sessions()[0].id, id);
        assert_eq!(list.current_id(), id);
        assert_eq!(list.neighbor(1), "old");
        assert_eq!(list.neighbor(-5), id);
    }

    #[test]
    fn switching_to_unknown_session_is_rejected() {
        let mut list = SessionList::from_sessions(vec![Session::with_id("a")]);
        assert_eq!(
            list.switch_to("missing"),
            Err(SessionError::UnknownSession("missing".into()))
        );
        assert_eq!(list.current_id(), "a");
    }

    #[test]
    fn deleting_current_session_keeps_selection_valid() {
        let mut list = SessionList::from_sessions(vec![
            Session::with_id("a"),
            Session::with_id("b"),
            Session::with_id("c"),
        ]);
        list.switch_to("c").unwrap();
        list.delete("c").unwrap();
        assert_eq!(list.current_id(), "b");

        list.delete("a").unwrap();
        assert_eq!(list.current_id(), "b");

        list.delete("b").unwrap();
        assert_eq!(list.len(), 1);
        assert!(list.get(list.current_id()).is_some());
        assert_ne!(list.current_id(), "b");
    }

    #[test]
    fn file_store_round_trips_in_order() {
        let dir = tempdir().expect("tempdir");
        let store = FileSessionStore::new(dir.path().join("nested").join("sessions.json"));
        assert!(store.load().expect("load missing").is_empty());

        let mut list = SessionList::from_sessions(vec![Session::with_id("first")]);
        list.new_chat();
        let current = list.current_id().to_string();
        list.append_to(&current, Message::user("Hello")).unwrap();
        list.append_to(&current, Message::assistant("Hi")).unwrap();
        list.persist(&store).expect("save");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, current);
        assert_eq!(loaded[0].title, "Hello");
        assert_eq!(
            loaded[0].messages,
            vec![Message::user("Hello"), Message::assistant("Hi")]
        );
        assert_eq!(loaded[1].id, "first");
    }

    #[test]
    fn file_store_reports_parse_errors_with_path() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("sessions.json");
        fs::write(&path, "{ not json").unwrap();
        let err = FileSessionStore::new(&path).load().unwrap_err();
        assert!(matches!(err, SessionStoreError::Parse { .. }));
        assert!(err.to_string().contains("sessions.json"));
    }

    #[test]
    fn sessions_without_optional_fields_still_load() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("sessions.json");
        fs::write(&path, r#"[{"id":"x","messages":[{"role":"user","content":"hey"}]}]"#).unwrap();
        let loaded = FileSessionStore::new(&path).load().expect("load");
        assert_eq!(loaded[0].title, DEFAULT_TITLE);
        assert_eq!(loaded[0].messages.len(), 1);
    }
}
