//! jcdiff CLI - differential conformance harness.

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "jcdiff=debug"
    } else if cli.silent {
        "jcdiff=error"
    } else {
        match &cli.command {
            Commands::Run { .. } => "jcdiff=info",
            Commands::Translate { .. } => "jcdiff=warn",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(default_level.parse().unwrap()),
        )
        .with_target(false)
        .init();

    let exit_code = commands::run_command(&cli);
    std::process::exit(exit_code);
}
