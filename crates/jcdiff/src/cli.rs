//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jcdiff::{ComplianceLevel, ReferenceHandle};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

/// Reference level assumed when a `--reference` spec carries no `:LEVEL`.
const DEFAULT_REFERENCE_LEVEL: u16 = 21;

#[derive(Parser)]
#[command(name = "jcdiff")]
#[command(about = "Differential conformance harness - cross-checks a compiler against references")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one scenario through the primary and every reference compiler
    Run {
        /// Source files; their file names become the scenario layout
        #[arg(value_name = "SOURCE", required = true)]
        sources: Vec<PathBuf>,

        /// Primary compiler command (invoked with options, -d OUT, sources)
        #[arg(long, value_name = "CMD")]
        primary: PathBuf,

        /// Reference compiler as PATH[:LEVEL]; repeatable
        #[arg(long = "reference", value_name = "PATH[:LEVEL]", action = clap::ArgAction::Append)]
        references: Vec<String>,

        /// Scenario name, used in reports and excuse lookup
        #[arg(long, default_value = "cli-scenario")]
        name: String,

        /// Option string in the primary compiler's dialect
        #[arg(long, default_value = "")]
        options: String,

        /// Negative scenario: the primary must reject the sources
        #[arg(long)]
        negative: bool,

        /// Substring expected in the primary diagnostics
        #[arg(long, value_name = "TEXT")]
        expect: Option<String>,

        /// Substring expected in the reference log when both reject
        #[arg(long, value_name = "TEXT")]
        expect_reference: Option<String>,

        /// Skip references below this compliance level
        #[arg(long, value_name = "LEVEL")]
        min_level: Option<u16>,

        /// Stop after the primary-only assertion
        #[arg(long)]
        primary_only: bool,

        /// Pin each reference run to its handle's release
        #[arg(long)]
        pin_release: bool,

        /// Output root for artifacts (default: per-scenario temp dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Translate a primary-dialect option string into the reference dialect
    Translate {
        /// Option string in the primary compiler's dialect
        #[arg(value_name = "OPTIONS")]
        options: String,

        /// Version override appended in place of release selectors
        #[arg(long, value_name = "TOKENS")]
        release: Option<String>,
    },
}

/// Parse a `PATH[:LEVEL]` reference spec.
pub fn parse_reference(spec: &str) -> Result<ReferenceHandle, String> {
    let (path, level) = match spec.rsplit_once(':') {
        Some((path, level)) if !path.is_empty() => {
            let level = level
                .parse::<u16>()
                .map_err(|_| format!("invalid level in reference spec '{spec}'"))?;
            (path, level)
        }
        _ => (spec, DEFAULT_REFERENCE_LEVEL),
    };
    if path.is_empty() {
        return Err(format!("empty path in reference spec '{spec}'"));
    }
    Ok(ReferenceHandle::new(path, ComplianceLevel(level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_spec_with_level() {
        let handle = parse_reference("/usr/bin/javac:17").unwrap();
        assert_eq!(handle.level, ComplianceLevel(17));
        assert_eq!(handle.program, PathBuf::from("/usr/bin/javac"));
    }

    #[test]
    fn reference_spec_defaults_level() {
        let handle = parse_reference("/usr/bin/javac").unwrap();
        assert_eq!(handle.level, ComplianceLevel(DEFAULT_REFERENCE_LEVEL));
    }

    #[test]
    fn bad_reference_specs_rejected() {
        assert!(parse_reference("/usr/bin/javac:latest").is_err());
        assert!(parse_reference("").is_err());
    }
}
