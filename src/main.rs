// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, parse arguments, hand off to
//   `commands::run`.
// - Any error ends the process with `Error: <message>` on stderr.

use std::process::ExitCode;

use clap::Parser;
use gobeat::{cli::Cli, commands};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Logs go to stderr so stdout only carries command output. Level is
    // overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut stdout = std::io::stdout().lock();
    match commands::run(cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", commands::render_error(&err));
            ExitCode::FAILURE
        }
    }
}
