//! Diagnostic logging.
//!
//! The chat view owns the terminal, so log output only ever goes to a file.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt as subscriber_fmt, EnvFilter};

pub const LOG_ENV: &str = "PARLEY_LOG";
pub const DEFAULT_DIRECTIVE: &str = "warn";

#[derive(Debug)]
pub enum LoggingError {
    Open { path: PathBuf, source: io::Error },
    Init(String),
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingError::Open { path, source } => {
                write!(f, "Failed to open log file {}: {}", path.display(), source)
            }
            LoggingError::Init(reason) => write!(f, "Failed to start logging: {reason}"),
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoggingError::Open { source, .. } => Some(source),
            LoggingError::Init(_) => None,
        }
    }
}

/// Filter from `PARLEY_LOG`, or `warn` when unset or invalid.
pub fn env_filter(value: Option<&str>) -> EnvFilter {
    value
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Install the global subscriber. Without a log file nothing is installed and
/// every event is dropped.
pub fn init_tracing(log_file: Option<&Path>) -> Result<(), LoggingError> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = open_log_file(path)?;
    let filter = env_filter(std::env::var(LOG_ENV).ok().as_deref());

    match subscriber_fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
    {
        Ok(()) => Ok(()),
        Err(err)
            if err
                .to_string()
                .contains("attempted to set a global default subscriber more than once") =>
        {
            Ok(())
        }
        Err(err) => Err(LoggingError::Init(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn invalid_directives_fall_back_to_warn() {
        assert_eq!(env_filter(Some("parley=loud")).to_string(), DEFAULT_DIRECTIVE);
        assert_eq!(env_filter(None).to_string(), DEFAULT_DIRECTIVE);
        assert_eq!(env_filter(Some("debug")).to_string(), "debug");
    }

    #[test]
    fn missing_log_directory_is_reported() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("parley.log");
        let err = init_tracing(Some(&path)).expect_err("should fail");
        assert!(matches!(err, LoggingError::Open { .. }));
    }

    #[test]
    fn no_log_file_is_a_no_op() {
        assert!(init_tracing(None).is_ok());
    }
}
