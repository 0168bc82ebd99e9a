//! I/O helpers for scenegen commands.

pub mod completion;
pub mod config;
pub mod process;
pub mod prompt;
pub mod renderer;
