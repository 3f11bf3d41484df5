//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod say;
pub mod session_list;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::cli::say::run_say;
use crate::cli::session_list::list_sessions;
use crate::core::app::AppInit;
use crate::core::config::data::{Config, ENDPOINT_ENV};
use crate::core::session::{FileSessionStore, SessionList, SessionStore};
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::init_tracing;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ", built ",
    env!("VERGEN_BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "parley")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "A terminal chat client that streams replies as they are written")]
#[command(
    long_about = "parley is a full-screen terminal chat client. Replies stream in from a chat \
endpoint and are rendered as markdown while they arrive. Conversations are kept locally \
and can be resumed later.\n\n\
Environment Variables:\n\
  PARLEY_ENDPOINT   Chat endpoint (overrides the config file)\n\
  PARLEY_LOG        Log filter used with --log-file (default: warn)\n\n\
Controls:\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a new line\n\
  Esc               Stop the reply being generated\n\
  Ctrl+N            Start a new chat\n\
  Ctrl+D            Delete the current chat (y confirms)\n\
  Alt+Up/Alt+Down   Switch between chats\n\
  Ctrl+T            Toggle light/dark theme\n\
  Ctrl+B            Toggle the chat list\n\
  Ctrl+J            Jump to your last question\n\
  Alt+1..Alt+3      Send an example prompt\n\
  Up/Down/PgUp/PgDn Scroll the conversation\n\
  Ctrl+C            Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Chat endpoint URL
    #[arg(short = 'e', long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(short = 'l', long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one prompt and stream the reply to stdout
    Say {
        /// Prompt text; multiple words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List stored chats
    Sessions,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

/// Config file path and contents; a missing file yields defaults.
pub(crate) fn load_config(path: Option<PathBuf>) -> Result<(Config, Option<PathBuf>), Box<dyn Error>> {
    let path = path.or_else(Config::default_path);
    let config = match &path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::default(),
    };
    Ok((config, path))
}

pub(crate) fn open_store(config: &Config) -> Result<FileSessionStore, Box<dyn Error>> {
    let path = config
        .sessions_path()
        .ok_or("Could not determine a data directory for stored chats; set sessions_path in the config file")?;
    Ok(FileSessionStore::new(path))
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log_file.as_deref())?;

    let (config, config_path) = load_config(args.config)?;
    let env_endpoint = std::env::var(ENDPOINT_ENV).ok();
    let endpoint = config.resolve_endpoint(args.endpoint.as_deref(), env_endpoint.as_deref());
    debug!(%endpoint, config = ?config_path, "resolved settings");

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let store = open_store(&config)?;
            let sessions = SessionList::from_sessions(store.load()?);
            run_chat(AppInit {
                sessions,
                store: Box::new(store),
                endpoint,
                config,
                config_path,
            })
            .await
        }
        Commands::Say { prompt } => run_say(prompt, endpoint).await,
        Commands::Sessions => {
            let store = open_store(&config)?;
            list_sessions(&store)
        }
    }
}
