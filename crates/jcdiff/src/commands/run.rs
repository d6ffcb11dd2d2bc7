//! The `run` command: one scenario, end to end.

use std::fs;
use std::path::Path;

use jcdiff::{
    Harness, HarnessConfig, ComplianceLevel, ProcessPrimary, ScenarioMode, SourceFile,
    TestScenario, print_outcome,
};

use crate::cli::{Cli, Commands, EXIT_FAILURE, EXIT_SUCCESS, parse_reference};

pub fn cmd_run(cli: &Cli) -> i32 {
    let Commands::Run {
        sources,
        primary,
        references,
        name,
        options,
        negative,
        expect,
        expect_reference,
        min_level,
        primary_only,
        pin_release,
        output,
    } = &cli.command
    else {
        unreachable!("run command variant mismatch");
    };

    let mut files = Vec::new();
    for path in sources {
        match read_source(path) {
            Ok(file) => files.push(file),
            Err(e) => {
                eprintln!("Error: {e}");
                return EXIT_FAILURE;
            }
        }
    }

    let mut scenario = TestScenario::new(name.clone(), files).with_options(options.clone());
    if *negative {
        scenario = scenario.with_mode(ScenarioMode::Negative);
    }
    if let Some(expected) = expect {
        scenario = scenario.with_expected_primary(expected.clone());
    }
    if let Some(expected) = expect_reference {
        scenario = scenario.with_expected_reference(expected.clone());
    }
    if let Some(level) = min_level {
        scenario = scenario.with_min_level(ComplianceLevel(*level));
    }

    let mut handles = Vec::new();
    for spec in references {
        match parse_reference(spec) {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                eprintln!("Error: {e}");
                return EXIT_FAILURE;
            }
        }
    }
    if handles.is_empty() && !primary_only {
        eprintln!("Error: no --reference given (use --primary-only to skip comparison)");
        return EXIT_FAILURE;
    }

    let mut config = HarnessConfig::new()
        .with_primary_only(*primary_only)
        .with_pin_reference_release(*pin_release);
    if let Some(root) = output {
        config = config.with_output_root(root.clone());
    }

    let harness = Harness::new(ProcessPrimary::new(primary.clone()), config).with_handles(handles);

    match harness.run(&scenario) {
        Ok(outcome) => {
            print_outcome(&outcome, 1, 1);
            if outcome.passed() {
                EXIT_SUCCESS
            } else {
                EXIT_FAILURE
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            EXIT_FAILURE
        }
    }
}

/// Load one source file; the scenario layout keeps only the file name.
fn read_source(path: &Path) -> Result<SourceFile, String> {
    let text =
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("not a file: {}", path.display()))?;
    Ok(SourceFile::new(file_name, text))
}
