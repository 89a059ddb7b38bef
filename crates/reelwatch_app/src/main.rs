use std::process::ExitCode;

use clap::Parser;

mod cli;
mod platform;

use platform::logging::{self, LogDestination};

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let destination = if cli.log_file {
        LogDestination::Both(cli.state_dir.clone())
    } else {
        LogDestination::Terminal
    };
    logging::initialize(destination, cli.verbose);

    match platform::run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
