//! livedj - an endless, mood-driven music stream.
//!
//! Give it a mood ("mellow jazz evening") and it keeps asking a generative
//! model for the next track, finds a playable source for it, and plays it
//! through mpv while prefetching the one after.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod player;
pub mod recommend;
pub mod resolve;
pub mod scheduler;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Logs go to stderr so they stay out of the session output
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "livedj=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();

    cli::run_command(args)
}
