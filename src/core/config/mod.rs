pub mod data;
pub mod defaults;
pub mod io;
