//! `mgsdb-upload` - command-line uploads to MGSDB
//!
//! Results go to stdout (text or `--json`); logs go to stderr through
//! `tracing`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mgsdb_cli::{commands, logging, AppContext, Cli, CliError};
use mgsdb_infra::config;
use tracing::{debug, error};

#[tokio::main]
async fn main() -> ExitCode {
    // Before parsing so env-backed flags (MGSDB_PASSWORD) see .env values
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(cli.log_json);

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(err) => debug!(error = %err, "No .env loaded"),
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "Command failed");
            eprintln!("error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = config::load(cli.config.clone()).context("failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config::validate(&config).context("invalid configuration")?;

    let ctx = AppContext::new(config).context("failed to initialise services")?;
    let report = commands::execute(&ctx, &cli.command).await?;
    println!("{}", report.render(cli.json)?);
    Ok(())
}
