//! ABOUTME: Entry point for the recipe executor CLI
//! ABOUTME: Initializes tracing, dispatches to `run`/`validate`, maps failure to exit code 1

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.log_dir.as_deref());

    match commands::execute_command(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

/// Tracing goes to stderr always, keeping stdout free for future structured
/// output; `--log-dir` additionally tees to a file in that directory.
fn setup_tracing(log_dir: Option<&std::path::Path>) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_dir) = log_dir else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        return;
    };

    match commands::log_file_path(log_dir) {
        Ok(path) => match std::fs::File::create(&path) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(move || file.try_clone().expect("log file handle"))
                    .with_target(false)
                    .init();
            }
            Err(e) => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .init();
                tracing::warn!(path = %path.display(), error = %e, "could not open log file, logging to stderr only");
            }
        },
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
            tracing::warn!(dir = %log_dir.display(), error = %e, "could not create log directory, logging to stderr only");
        }
    }
}
