//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level parser for `gobeat`.
#[derive(Debug, Parser)]
#[command(
    name = "gobeat",
    version,
    about = "gobeat tweets scores of game matches from an account configured server-side."
)]
pub struct Cli {
    /// Settings file to use instead of `~/.gobeat`.
    #[arg(long, global = true, env = "GOBEAT_SETTINGS", value_name = "PATH")]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show or set the URL of the server that gobeat talks to.
    #[command(visible_alias = "t")]
    Target { url: Option<String> },

    /// Show or set the current user.
    #[command(visible_alias = "u")]
    User { username: Option<String> },

    /// Send a result to be tweeted.
    #[command(visible_alias = "r")]
    Result {
        opponent: Option<String>,
        score: Option<String>,
    },
}
