// Entrypoint for the CLI application.
// - Keeps `main` small: logging, arguments, config, then hand off to `ui`.
// - Each error kind maps to its own exit code (see `PaiError::exit_code`).

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::{error, warn};
use pai_cli::{cancel::CancellationToken, config::Config, ui, PaiError};

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .format_target(false)
        .init();
}

fn run(args: ui::CliArgs) -> anyhow::Result<()> {
    // Checked before anything touches the network.
    let config = Config::from_env()
        .map_err(PaiError::from)
        .context("Failed to load configuration")?;

    let cancel = CancellationToken::new();
    let handle = cancel.clone();
    ctrlc::set_handler(move || {
        if handle.is_cancelled() {
            warn!("Second interrupt, exiting immediately");
            std::process::exit(130);
        }
        warn!("Interrupt received, stopping after the current request");
        warn!("Press Ctrl-C again to abort immediately");
        handle.cancel();
    })
    .context("Failed to install Ctrl-C handler")?;

    ui::run(args.command, &config, &cancel)
}

fn main() -> ExitCode {
    init_logger();
    let args = ui::CliArgs::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            let code = err
                .downcast_ref::<PaiError>()
                .map(PaiError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
