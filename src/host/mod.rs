//! Headless host: keyboard vocabulary and the stdio render/lifecycle bridge

pub mod handler;
pub mod keymap;
pub mod protocol;

pub use handler::run_stdio;
pub use keymap::Keymap;
