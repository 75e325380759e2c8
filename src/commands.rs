// Command layer: turns a parsed subcommand into actions on the settings
// record and the result client. Settings are passed in and handed back
// so the caller decides what to do with them; output goes to the writer
// supplied by the caller.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::debug;

use crate::api::ResultClient;
use crate::cli::{Cli, Command};
use crate::settings::{Settings, SettingsStore};

/// Usage errors detected before any I/O happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("missing opponent name and score")]
    MissingResultArgs,
}

/// Load settings from the selected store and run the chosen subcommand.
pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let store = match cli.settings {
        Some(path) => SettingsStore::at(path),
        None => SettingsStore::default_location()?,
    };
    let settings = store.load().context("Loading settings")?;
    let client = ResultClient::new().context("Failed to build HTTP client")?;

    dispatch(cli.command, settings, &store, &client, out)?;
    Ok(())
}

/// Single-line report for an error that ends the process, with its cause
/// chain joined by `: `.
pub fn render_error(err: &anyhow::Error) -> String {
    format!("Error: {err:#}")
}

/// Run one subcommand. Returns the settings as they are after the command,
/// already saved if the command changed them.
pub fn dispatch(
    command: Command,
    mut settings: Settings,
    store: &SettingsStore,
    client: &ResultClient,
    out: &mut impl Write,
) -> Result<Settings> {
    debug!(?command, "dispatching");
    match command {
        Command::Target { url: None } => {
            writeln!(out, "Current target: {}", settings.target_url)?;
        }
        Command::Target { url: Some(url) } => {
            settings.target_url = url;
            settings.check_target()?;
            writeln!(out, "Set target to {}", settings.target_url)?;
            store.save(&settings).context("Saving settings")?;
        }
        Command::User { username: None } => {
            writeln!(out, "Current user: {}", settings.user)?;
        }
        Command::User {
            username: Some(username),
        } => {
            settings.user = username;
            writeln!(out, "Set user to {}", settings.user)?;
            store.save(&settings).context("Saving settings")?;
        }
        Command::Result {
            opponent: Some(opponent),
            score: Some(score),
        } => {
            let url = settings.resolve_url()?;
            post_with_spinner(client, url.as_ref(), &settings, &opponent, &score)?;
            writeln!(out, "Successfully posted result. Congratulations!")?;
        }
        Command::Result { .. } => return Err(CommandError::MissingResultArgs.into()),
    }
    Ok(settings)
}

fn post_with_spinner(
    client: &ResultClient,
    url: Option<&url::Url>,
    settings: &Settings,
    opponent: &str,
    score: &str,
) -> Result<()> {
    // Spinner draws on stderr and hides itself when that is not a terminal.
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message("Posting result...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let res = client.post_result(url, settings, opponent, score);
    spinner.finish_and_clear();
    res?;
    Ok(())
}
