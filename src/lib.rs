//! parley is a terminal chat client built around an incremental stream pipeline.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the pipeline: frame decoding, event interpretation,
//!   incremental rendering, scroll coordination, and the stream session
//!   controller, plus session history and configuration.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`api`] defines the request and payload types exchanged with the endpoint.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which loads config and history and dispatches
//! into [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
