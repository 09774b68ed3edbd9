mod cli;
mod workflow;

use std::{io, process::ExitCode};

use anyhow::{bail, Result};
use clap::Parser;
use oecd_sdmx::{lookup, HttpTransport, Query, SqliteLookup};

use cli::{Cli, Settings};

fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::from(&cli);
    let stdout = io::stdout();

    if cli.interactive {
        if !cli.args.is_empty() {
            bail!("Interactive mode does not take other arguments");
        }
        let transport = HttpTransport::new()?;
        workflow::run_interactive(
            &transport,
            &settings,
            &mut io::stdin().lock(),
            &mut stdout.lock(),
        )?;
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(target) = cli.check {
        let target = match target {
            cli::CheckTarget::Subject => lookup::CheckTarget::Subject,
            cli::CheckTarget::Indicator => lookup::CheckTarget::Indicator,
            cli::CheckTarget::Unit => lookup::CheckTarget::Unit,
        };
        let source = SqliteLookup::open(&cli.database)?;
        let passed = workflow::run_check(
            target,
            HttpTransport::new()?,
            &source,
            &settings,
            &mut stdout.lock(),
        )?;
        return Ok(if passed {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    // arguments are validated before anything touches the network
    let query = Query::from_args(&cli.args)?;
    workflow::run_shell(query, HttpTransport::new()?, &settings, &mut stdout.lock())?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
