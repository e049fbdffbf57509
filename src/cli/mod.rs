//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, the interactive
//! command parser and the composer runner.

pub mod app;
pub mod args;
pub mod commands;
pub mod config_cmd;
pub mod presenter;

// Re-export commonly used types
pub use app::{run_composer, JsonLineSender, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction};
pub use commands::{Command, CommandError};
pub use presenter::Presenter;
