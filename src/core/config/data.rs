use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/chat/messages";
pub const ENDPOINT_ENV: &str = "PARLEY_ENDPOINT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    #[default]
    Dark,
    Light,
}

impl ThemeChoice {
    pub fn toggled(self) -> Self {
        match self {
            ThemeChoice::Dark => ThemeChoice::Light,
            ThemeChoice::Light => ThemeChoice::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeChoice::Dark => "dark",
            ThemeChoice::Light => "light",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Chat endpoint receiving the POSTed user turn
    pub endpoint: Option<String>,
    /// UI theme, toggled from the chat view
    pub theme: Option<ThemeChoice>,
    /// Lines from the bottom within which scrolling resumes auto-follow
    pub scroll_threshold: Option<u16>,
    /// Enable syntax highlighting for fenced code blocks
    pub syntax: Option<bool>,
    /// Override for the session history file
    pub sessions_path: Option<PathBuf>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/parley/config.toml` → `~/.config/parley/config.toml`
/// - Windows paths are shown unchanged
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
