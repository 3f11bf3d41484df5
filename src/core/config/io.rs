use crate::core::config::data::{path_display, Config};
use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Directory that holds `path`. Temp files are created there so the final
/// rename never crosses filesystems; a bare file name means the working directory.
pub(crate) fn write_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Errors that can occur when loading or saving configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Failed to write the configuration file.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    Serialize(toml::ser::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(
                    f,
                    "Failed to read config at {}: {}",
                    path_display(path),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    path_display(path),
                    source
                )
            }
            ConfigError::Write { path, source } => {
                write!(
                    f,
                    "Failed to save config to {}: {}",
                    path_display(path),
                    source
                )
            }
            ConfigError::Serialize(source) => write!(f, "Failed to serialize config: {source}"),
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Write { source, .. } => Some(source),
            ConfigError::Serialize(source) => Some(source),
        }
    }
}

impl Config {
    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: config_path.to_path_buf(),
            source,
        };
        let dir = write_dir(config_path);
        fs::create_dir_all(dir).map_err(write_err)?;

        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        let mut temp_file = NamedTempFile::new_in(dir).map_err(write_err)?;

        temp_file.write_all(contents.as_bytes()).map_err(write_err)?;
        temp_file.as_file_mut().sync_all().map_err(write_err)?;
        temp_file
            .persist(config_path)
            .map_err(|err| write_err(err.error))?;
        Ok(())
    }

    /// Re-read the file, apply `mutator`, and write the result back so edits
    /// made elsewhere since startup are kept.
    pub fn update_at<F>(config_path: &Path, mutator: F) -> Result<Config, ConfigError>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = Config::load_from_path(config_path)?;
        mutator(&mut config);
        config.save_to_path(config_path)?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "parley", "parley")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
