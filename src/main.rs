//! `modinstall` command-line entry point.

use clap::Parser;
use std::process::ExitCode;

use modinstall_cli::{cli, commands, logging};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose);

    match commands::dispatch(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::console::failure(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
