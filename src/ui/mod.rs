//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the interaction loop that turns key presses and stream
//!   messages into [`crate::core::app::AppAction`]s.
//! - [`renderer`], [`layout`] and [`transcript`]: view composition and frame output.
//! - [`markdown`] and [`theme`]: how replies look.
//!
//! Ownership boundary: this layer presents and captures interaction state, while
//! [`crate::core`] owns the stream pipeline and session history.

pub mod chat_loop;
pub mod layout;
pub mod markdown;
pub mod renderer;
pub mod theme;
pub mod transcript;
