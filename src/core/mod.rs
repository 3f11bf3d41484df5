pub mod app;
pub mod chat_stream;
pub mod config;
pub mod controller;
pub mod frame;
pub mod interpreter;
pub mod message;
pub mod render;
pub mod scroll;
pub mod session;
