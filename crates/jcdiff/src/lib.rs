//! jcdiff - differential conformance harness for a compiler frontend.
//!
//! Drives a primary (in-process) compiler through source-code scenarios and
//! cross-validates diagnostics and generated `.class` artifacts against one
//! or more independently maintained reference compilers invoked as
//! subprocesses. Known, intentional divergences are registered as excuses
//! and reported without failing.
//!
//! # Example
//!
//! ```ignore
//! use jcdiff::{Harness, HarnessConfig, ReferenceHandle, ComplianceLevel, TestScenario, SourceFile};
//!
//! let harness = Harness::new(my_frontend, HarnessConfig::new())
//!     .with_handles(vec![ReferenceHandle::new("/usr/bin/javac", ComplianceLevel(21))]);
//! let outcome = harness.run(&TestScenario::new(
//!     "ClassDecl001",
//!     vec![SourceFile::new("A.java", "class A {}")],
//! ))?;
//! assert!(outcome.passed());
//! ```

pub mod artifacts;
pub mod classify;
pub mod dialect;
mod error;
pub mod harness;
pub mod invoke;
pub mod scenario;

pub use artifacts::{ARTIFACT_SUFFIX, ArtifactDiff, ArtifactSnapshot, ArtifactTracker};
pub use classify::{
    Excuse, ExcuseRegistry, LevelPredicate, MismatchKind, MismatchRecord, Observation, classify,
};
pub use dialect::{CommandLine, translate};
pub use error::{Error, Result};
pub use harness::{
    Harness, HarnessConfig, IterationFailure, PrimaryCompiler, PrimaryResult, ProcessPrimary,
    RunSummary, ScenarioOutcome, SuppressedDivergence, print_outcome, print_summary,
};
pub use invoke::{ExecutionResult, Invoker, LogTrimmer, ReferenceHandle};
pub use scenario::{ComplianceLevel, ScenarioMode, SourceFile, TestScenario};
