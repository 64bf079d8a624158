//! Command-line interface for livedj.
//!
//! `livedj play` runs an interactive listening session in the terminal;
//! `livedj config` inspects and edits the stored settings.

mod commands;

pub use commands::{Cli, Commands, ConfigAction, run_command};
