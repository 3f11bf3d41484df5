use crate::core::config::data::{Config, ThemeChoice, DEFAULT_ENDPOINT};
use crate::core::scroll::DEFAULT_FOLLOW_THRESHOLD;
use crate::core::session::FileSessionStore;
use std::path::PathBuf;

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    /// Endpoint precedence: command-line flag, then environment, then config file.
    pub fn resolve_endpoint(&self, flag: Option<&str>, env: Option<&str>) -> String {
        non_empty(flag)
            .or_else(|| non_empty(env))
            .or_else(|| non_empty(self.endpoint.as_deref()))
            .unwrap_or(DEFAULT_ENDPOINT)
            .to_string()
    }

    pub fn theme_choice(&self) -> ThemeChoice {
        self.theme.unwrap_or_default()
    }

    pub fn scroll_threshold(&self) -> u16 {
        self.scroll_threshold.unwrap_or(DEFAULT_FOLLOW_THRESHOLD)
    }

    pub fn syntax_enabled(&self) -> bool {
        self.syntax.unwrap_or(true)
    }

    pub fn sessions_path(&self) -> Option<PathBuf> {
        self.sessions_path
            .clone()
            .or_else(FileSessionStore::default_path)
    }
}
