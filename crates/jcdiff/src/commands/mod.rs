//! Command implementations.

mod run;
mod translate;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Run { .. } => run::cmd_run(cli),
        Commands::Translate { options, release } => {
            translate::cmd_translate(options, release.as_deref())
        }
    }
}
