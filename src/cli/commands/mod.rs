//! CLI command definitions and dispatch.
//!
//! Each subcommand lives in its own submodule:
//! - `play`: interactive listening session
//! - `config`: show, locate and edit settings
//! - `prompt`: stdin line reader and the settings prompt shared by both

mod config;
mod play;
mod prompt;

use clap::{Parser, Subcommand};

pub use config::{cmd_config_path, cmd_config_set, cmd_config_show};
pub use play::cmd_play;

/// livedj - endless music picked for your mood
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Start a listening session (the default when no command is given)
    Play {
        /// Mood description, e.g. "mellow jazz evening" (prompted if omitted)
        mood: Vec<String>,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current settings with secrets masked
    Show,
    /// Print the config file location
    Path,
    /// Set provider API keys
    Set {
        /// Recommendation provider API key
        #[arg(long, env = "LIVEDJ_AI_KEY")]
        ai_key: Option<String>,
        /// Media search provider API key
        #[arg(long, env = "LIVEDJ_MUSIC_KEY")]
        music_key: Option<String>,
        /// Recommendation provider (claude)
        #[arg(long)]
        ai_provider: Option<String>,
        /// Media search provider (youtube)
        #[arg(long)]
        music_provider: Option<String>,
    },
}

/// Run the parsed command line.
pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Play { mood }) => cmd_play(join_mood(&mood)),
        None => cmd_play(None),
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Path => cmd_config_path(),
            ConfigAction::Set {
                ai_key,
                music_key,
                ai_provider,
                music_provider,
            } => cmd_config_set(
                ai_key.as_deref(),
                music_key.as_deref(),
                ai_provider.as_deref(),
                music_provider.as_deref(),
            ),
        },
    }
}

/// Join unquoted words into one mood; `None` when blank.
fn join_mood(words: &[String]) -> Option<String> {
    let mood = words.join(" ").trim().to_string();
    (!mood.is_empty()).then_some(mood)
}
