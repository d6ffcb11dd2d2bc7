//! Differential run orchestration.
//!
//! Runs the primary compiler over a scenario, then replays the scenario
//! against every configured reference compiler and classifies agreement.
//! Scenarios run strictly sequentially: primary and reference runs share one
//! reused output directory, and the artifact tracker's destructive-read
//! snapshot is the only synchronization between iterations.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::artifacts::{ArtifactSnapshot, ArtifactTracker};
use crate::classify::{self, ExcuseRegistry, MismatchRecord, Observation};
use crate::dialect::{self, CommandLine};
use crate::invoke::{Invoker, ReferenceHandle};
use crate::scenario::{ScenarioMode, TestScenario};
use crate::{Error, Result};

/// Result of one in-process primary compilation.
#[derive(Debug, Clone)]
pub struct PrimaryResult {
    /// Captured diagnostics text.
    pub diagnostics: String,
    /// Whether compilation succeeded.
    pub succeeded: bool,
}

/// The in-process compiler implementation under test.
///
/// The harness treats it as a black box: sources in, diagnostics and
/// artifacts (under `out_dir`) out.
pub trait PrimaryCompiler {
    fn compile(&self, sources: &[PathBuf], options: &str, out_dir: &Path)
    -> Result<PrimaryResult>;
}

/// Adapter running an arbitrary compiler command as the primary, so the CLI
/// binary can drive scenarios without an embedded frontend.
#[derive(Debug, Clone)]
pub struct ProcessPrimary {
    program: PathBuf,
}

impl ProcessPrimary {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PrimaryCompiler for ProcessPrimary {
    fn compile(
        &self,
        sources: &[PathBuf],
        options: &str,
        out_dir: &Path,
    ) -> Result<PrimaryResult> {
        let output = Command::new(&self.program)
            .args(options.split_whitespace())
            .arg("-d")
            .arg(out_dir)
            .args(sources)
            .output()
            .map_err(|source| Error::Invocation {
                program: self.program.display().to_string(),
                source,
            })?;

        let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
        diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(PrimaryResult {
            diagnostics,
            succeeded: output.status.success(),
        })
    }
}

/// Harness configuration.
///
/// The scenario-name filter lives here, injected into the orchestrator,
/// rather than in process-wide state.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Root for scenario output directories; scenarios get a subdirectory
    /// each. Unset means a per-scenario temporary directory.
    pub output_root: Option<PathBuf>,
    /// Disable to stop after the primary-only assertion.
    pub primary_only: bool,
    /// Pin each reference run to its handle's release via a translation
    /// version override.
    pub pin_reference_release: bool,
    /// Append source file names after the option string. Disable for
    /// invocation shapes that already embed them.
    pub repeat_file_names: bool,
    /// Run only scenarios whose name contains this substring.
    pub filter: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HarnessConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            output_root: None,
            primary_only: false,
            pin_reference_release: false,
            repeat_file_names: true,
            filter: None,
        }
    }

    #[must_use]
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn with_primary_only(mut self, primary_only: bool) -> Self {
        self.primary_only = primary_only;
        self
    }

    #[must_use]
    pub fn with_pin_reference_release(mut self, pin: bool) -> Self {
        self.pin_reference_release = pin;
        self
    }

    #[must_use]
    pub fn with_repeat_file_names(mut self, repeat: bool) -> Self {
        self.repeat_file_names = repeat;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// A per-handle harness breakage (translation or invocation failure), kept
/// apart from mismatches: "harness broke" is not "compilers disagree".
#[derive(Debug, Clone)]
pub struct IterationFailure {
    pub handle: String,
    pub error: String,
}

/// A detected divergence that a registered excuse downgraded to a log entry.
#[derive(Debug, Clone)]
pub struct SuppressedDivergence {
    pub record: MismatchRecord,
    pub justification: String,
}

/// Outcome of one scenario across all qualifying reference handles.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub scenario: String,
    /// Whether the primary-only assertion held.
    pub primary_ok: bool,
    pub primary_diagnostics: String,
    pub mismatches: Vec<MismatchRecord>,
    pub harness_failures: Vec<IterationFailure>,
    pub suppressed: Vec<SuppressedDivergence>,
}

impl ScenarioOutcome {
    /// A scenario passes only if the primary assertion held and no
    /// non-suppressed mismatch or harness failure was recorded.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.primary_ok && self.mismatches.is_empty() && self.harness_failures.is_empty()
    }

    /// Human-readable failure cause, if any.
    #[must_use]
    pub fn failure_cause(&self) -> Option<String> {
        if self.passed() {
            return None;
        }
        if !self.primary_ok {
            return Some(format!(
                "primary assertion failed:\n{}",
                self.primary_diagnostics
            ));
        }
        let mut parts: Vec<String> = self.mismatches.iter().map(ToString::to_string).collect();
        parts.extend(
            self.harness_failures
                .iter()
                .map(|f| format!("harness failure [{}]: {}", f.handle, f.error)),
        );
        Some(parts.join("\n"))
    }
}

/// Drives scenarios through the primary compiler and every configured
/// reference handle.
pub struct Harness<P> {
    primary: P,
    handles: Vec<ReferenceHandle>,
    registry: ExcuseRegistry,
    invoker: Invoker,
    tracker: ArtifactTracker,
    config: HarnessConfig,
}

impl<P: PrimaryCompiler> Harness<P> {
    pub fn new(primary: P, config: HarnessConfig) -> Self {
        Self {
            primary,
            handles: Vec::new(),
            registry: ExcuseRegistry::new(),
            invoker: Invoker::new(),
            tracker: ArtifactTracker::new(),
            config,
        }
    }

    /// Reference handles are built once at startup and iterated in
    /// configuration order.
    #[must_use]
    pub fn with_handles(mut self, handles: Vec<ReferenceHandle>) -> Self {
        self.handles = handles;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: ExcuseRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_invoker(mut self, invoker: Invoker) -> Self {
        self.invoker = invoker;
        self
    }

    #[must_use]
    pub fn with_tracker(mut self, tracker: ArtifactTracker) -> Self {
        self.tracker = tracker;
        self
    }

    /// Run one scenario to completion.
    ///
    /// Iteration-scoped errors (translation, invocation) are absorbed into
    /// the outcome per handle; scenario-scoped errors (artifact I/O, source
    /// materialization) propagate out, since the output directory state is
    /// unknown afterwards.
    pub fn run(&self, scenario: &TestScenario) -> Result<ScenarioOutcome> {
        let work = tempfile::tempdir()?;
        scenario.materialize(work.path())?;

        let out_dir = self.out_dir_for(scenario, work.path());
        fs::create_dir_all(&out_dir)?;

        let sources: Vec<PathBuf> = scenario
            .sources
            .iter()
            .map(|s| work.path().join(&s.path))
            .collect();
        let primary = self
            .primary
            .compile(&sources, &scenario.options, &out_dir)?;
        let primary_ok = primary_assertion_holds(scenario, &primary);
        debug!(
            scenario = %scenario.name,
            accepted = primary.succeeded,
            primary_ok,
            "primary compilation done"
        );

        let mut outcome = ScenarioOutcome {
            scenario: scenario.name.clone(),
            primary_ok,
            primary_diagnostics: primary.diagnostics.clone(),
            mismatches: Vec::new(),
            harness_failures: Vec::new(),
            suppressed: Vec::new(),
        };

        if self.config.primary_only {
            return Ok(outcome);
        }

        // The primary's output is the expected artifact set for every
        // reference iteration; capturing it also clears the directory for
        // the first reference run.
        let expected = self.tracker.take_and_clear(&out_dir)?;

        for handle in self.qualifying_handles(scenario) {
            match self.run_iteration(scenario, work.path(), &out_dir, handle, &primary, &expected) {
                Ok(None) => {}
                Ok(Some(record)) => {
                    let excuse = self
                        .registry
                        .excuse_for(handle, &scenario.name)
                        .filter(|excuse| excuse.covers(record.kind));
                    if let Some(excuse) = excuse {
                        info!(
                            scenario = %scenario.name,
                            handle = %handle.name,
                            kind = %record.kind,
                            justification = %excuse.justification,
                            "divergence suppressed by registered excuse"
                        );
                        outcome.suppressed.push(SuppressedDivergence {
                            record,
                            justification: excuse.justification.clone(),
                        });
                    } else {
                        outcome.mismatches.push(record);
                    }
                }
                Err(err) if err.is_iteration_scoped() => {
                    warn!(
                        scenario = %scenario.name,
                        handle = %handle.name,
                        error = %err,
                        "reference iteration aborted"
                    );
                    outcome.harness_failures.push(IterationFailure {
                        handle: handle.name.clone(),
                        error: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        Ok(outcome)
    }

    /// Run every scenario, applying the configured name filter.
    pub fn run_all(&self, scenarios: &[TestScenario]) -> RunSummary {
        let mut summary = RunSummary::default();
        let total = scenarios.len();

        for (index, scenario) in scenarios.iter().enumerate() {
            if let Some(filter) = &self.config.filter {
                if !scenario.name.contains(filter.as_str()) {
                    summary.skipped += 1;
                    continue;
                }
            }
            match self.run(scenario) {
                Ok(outcome) => {
                    print_outcome(&outcome, index + 1, total);
                    summary.add(outcome);
                }
                Err(err) => {
                    // Scenario-fatal harness error: the comparison never
                    // completed, so report it as such, not as a mismatch.
                    println!(
                        "[{}/{}] {}BROKE{} {} ({err})",
                        index + 1,
                        total,
                        colors::RED,
                        colors::RESET,
                        scenario.name
                    );
                    summary.failed += 1;
                    summary.failures.push((scenario.name.clone(), err.to_string()));
                }
            }
        }

        summary
    }

    fn out_dir_for(&self, scenario: &TestScenario, work_dir: &Path) -> PathBuf {
        self.config.output_root.as_ref().map_or_else(
            || work_dir.join("out"),
            |root| root.join(scenario_subdir(&scenario.name)),
        )
    }

    /// Handles below the scenario's minimum compliance level are filtered
    /// here, upstream of classification.
    fn qualifying_handles<'a>(
        &'a self,
        scenario: &'a TestScenario,
    ) -> impl Iterator<Item = &'a ReferenceHandle> {
        self.handles
            .iter()
            .filter(move |handle| scenario.min_level.is_none_or(|min| handle.level >= min))
    }

    /// One (scenario, handle) iteration: translate, clear, invoke,
    /// snapshot, diff against the primary's expected set, classify. Yields
    /// at most one mismatch record.
    fn run_iteration(
        &self,
        scenario: &TestScenario,
        work_dir: &Path,
        out_dir: &Path,
        handle: &ReferenceHandle,
        primary: &PrimaryResult,
        expected: &ArtifactSnapshot,
    ) -> Result<Option<MismatchRecord>> {
        let version_override = self
            .config
            .pin_reference_release
            .then(|| format!("--release {}", handle.level));
        let translated =
            dialect::translate(&CommandLine::parse(&scenario.options), version_override.as_deref())?;

        let mut tokens = translated.tokens().to_vec();
        tokens.push("-d".to_string());
        tokens.push(out_dir.display().to_string());
        let rendered = CommandLine::from_tokens(tokens).render();

        // The previous iteration's post-run snapshot left the directory
        // artifact-free; clear any residue anyway so the reference always
        // starts from a known-empty state, and report it rather than
        // folding it into this handle's diff.
        let residue = self.tracker.take_and_clear(out_dir)?;
        if !residue.is_empty() {
            warn!(
                scenario = %scenario.name,
                handle = %handle.name,
                count = residue.len(),
                "output directory was not artifact-free before invocation"
            );
        }

        let execution = self.invoker.invoke(
            handle,
            work_dir,
            &rendered,
            &scenario.source_names(),
            self.config.repeat_file_names,
        )?;

        let actual = self.tracker.take_and_clear(out_dir)?;
        let diff = expected.diff(&actual);
        if !diff.is_clean() {
            warn!(
                scenario = %scenario.name,
                handle = %handle.name,
                %diff,
                "artifact sets differ"
            );
        }

        let observation = Observation {
            primary_accepted: primary.succeeded,
            reference_accepted: execution.success,
            log_has_expected: execution.log.contains(scenario.reference_expectation()),
            log_has_error_marker: classify::log_has_error_marker(&execution.log),
            artifacts_clean: diff.is_clean(),
        };

        Ok(classify::classify(&observation).map(|kind| MismatchRecord {
            kind,
            scenario: scenario.name.clone(),
            handle: handle.name.clone(),
            primary_log: primary.diagnostics.clone(),
            reference_log: execution.log,
        }))
    }
}

/// Evaluate the primary-only expectation per scenario mode.
fn primary_assertion_holds(scenario: &TestScenario, primary: &PrimaryResult) -> bool {
    match scenario.mode {
        ScenarioMode::Conforming => {
            primary.succeeded
                && (scenario.expected_primary.is_empty()
                    || primary.diagnostics.contains(&scenario.expected_primary))
        }
        ScenarioMode::Negative => {
            !primary.succeeded && primary.diagnostics.contains(&scenario.expected_primary)
        }
    }
}

fn scenario_subdir(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Summary of a scenario batch.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub suppressed: usize,
    pub failures: Vec<(String, String)>,
}

impl RunSummary {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn add(&mut self, outcome: ScenarioOutcome) {
        self.suppressed += outcome.suppressed.len();
        if outcome.passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
            let cause = outcome
                .failure_cause()
                .unwrap_or_else(|| "unknown".to_string());
            self.failures.push((outcome.scenario, cause));
        }
    }
}

/// ANSI color codes.
pub mod colors {
    pub const RED: &str = "\x1b[0;31m";
    pub const GREEN: &str = "\x1b[0;32m";
    pub const YELLOW: &str = "\x1b[0;33m";
    pub const RESET: &str = "\x1b[0m";
}

/// Print one scenario result line.
pub fn print_outcome(outcome: &ScenarioOutcome, index: usize, total: usize) {
    if outcome.passed() {
        println!(
            "[{}/{}] {}PASS{} {}",
            index,
            total,
            colors::GREEN,
            colors::RESET,
            outcome.scenario
        );
    } else {
        let cause = outcome
            .failure_cause()
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "[{}/{}] {}FAIL{} {}\n{}",
            index,
            total,
            colors::RED,
            colors::RESET,
            outcome.scenario,
            cause
        );
    }
    for suppressed in &outcome.suppressed {
        println!(
            "        {}EXCUSED{} {} ({})",
            colors::YELLOW,
            colors::RESET,
            suppressed.record.kind,
            suppressed.justification
        );
    }
}

/// Print batch summary.
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("================================");
    println!(
        "{}PASSED{}: {}",
        colors::GREEN,
        colors::RESET,
        summary.passed
    );
    println!("{}FAILED{}: {}", colors::RED, colors::RESET, summary.failed);
    println!(
        "{}SKIPPED{}: {}",
        colors::YELLOW,
        colors::RESET,
        summary.skipped
    );
    if summary.suppressed > 0 {
        println!(
            "{}EXCUSED{}: {}",
            colors::YELLOW,
            colors::RESET,
            summary.suppressed
        );
    }
    println!();

    if !summary.failures.is_empty() {
        println!("Failures:");
        for (name, cause) in &summary.failures {
            println!("  {name}:");
            for line in cause.lines() {
                println!("    {line}");
            }
        }
        println!();
    }
}
