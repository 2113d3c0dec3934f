//! Presentation layer for roundtable
//!
//! CLI definitions, console output for chat and round-table
//! discussions, and the interactive REPL.

pub mod chat;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use chat::ChatRepl;
pub use cli::commands::{Cli, Command, ConfigCommand};
pub use output::console::ConsolePresenter;
