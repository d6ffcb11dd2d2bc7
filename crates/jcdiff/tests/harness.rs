//! End-to-end harness tests against a fake reference compiler.
//!
//! The reference compiler is fabricated as an executable shell script per
//! test, so these run without any real toolchain installed.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use jcdiff::{
    ComplianceLevel, Excuse, ExcuseRegistry, Harness, HarnessConfig, LevelPredicate, MismatchKind,
    PrimaryCompiler, PrimaryResult, ReferenceHandle, ScenarioMode, SourceFile, TestScenario,
};

/// Primary double with a fixed verdict that writes fixed artifacts.
struct StubPrimary {
    succeeded: bool,
    diagnostics: &'static str,
    artifacts: Vec<&'static str>,
}

impl PrimaryCompiler for StubPrimary {
    fn compile(
        &self,
        _sources: &[PathBuf],
        _options: &str,
        out_dir: &Path,
    ) -> jcdiff::Result<PrimaryResult> {
        for artifact in &self.artifacts {
            fs::write(out_dir.join(artifact), b"\xca\xfe\xba\xbe")?;
        }
        Ok(PrimaryResult {
            diagnostics: self.diagnostics.to_string(),
            succeeded: self.succeeded,
        })
    }
}

/// Write an executable reference-compiler script. The script body sees the
/// translated option string (including `-d <outdir>`) and the source names.
fn fake_reference(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("refc");
    let script = format!(
        "#!/bin/sh\nout=\"\"\nprev=\"\"\nfor a in \"$@\"; do\n  if [ \"$prev\" = \"-d\" ]; then out=\"$a\"; fi\n  prev=\"$a\"\ndone\n{body}\n"
    );
    fs::write(&path, script).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn handle_for(program: &Path) -> ReferenceHandle {
    ReferenceHandle::new(program, ComplianceLevel(17)).with_name("refc-17")
}

fn class_a_scenario() -> TestScenario {
    TestScenario::new("ClassA", vec![SourceFile::new("A.java", "class A {}")])
}

fn unresolved_scenario() -> TestScenario {
    TestScenario::new(
        "Unresolved",
        vec![SourceFile::new("A.java", "class A { Foo f; }")],
    )
    .with_mode(ScenarioMode::Negative)
    .with_expected_primary("cannot be resolved")
}

#[test]
fn accept_accept_with_matching_artifacts_passes() {
    let temp = tempfile::tempdir().unwrap();
    let reference = fake_reference(temp.path(), "touch \"$out/A.class\"\nexit 0");

    let primary = StubPrimary {
        succeeded: true,
        diagnostics: "",
        artifacts: vec!["A.class"],
    };
    let harness = Harness::new(primary, HarnessConfig::new())
        .with_handles(vec![handle_for(&reference)]);

    let outcome = harness.run(&class_a_scenario()).unwrap();
    assert!(outcome.passed(), "cause: {:?}", outcome.failure_cause());
    assert!(outcome.mismatches.is_empty());
    assert!(outcome.suppressed.is_empty());
}

#[test]
fn every_agreeing_handle_passes_not_just_the_first() {
    let temp = tempfile::tempdir().unwrap();
    let reference = fake_reference(temp.path(), "touch \"$out/A.class\"\nexit 0");

    let primary = StubPrimary {
        succeeded: true,
        diagnostics: "",
        artifacts: vec!["A.class"],
    };
    // Two handles over the same compiler: the expected artifact set comes
    // from the primary's single run, so the second iteration must compare
    // against it too rather than against an emptied directory.
    let harness = Harness::new(primary, HarnessConfig::new()).with_handles(vec![
        ReferenceHandle::new(&reference, ComplianceLevel(17)).with_name("refc-17"),
        ReferenceHandle::new(&reference, ComplianceLevel(21)).with_name("refc-21"),
    ]);

    let outcome = harness.run(&class_a_scenario()).unwrap();
    assert!(outcome.passed(), "cause: {:?}", outcome.failure_cause());
    assert!(outcome.mismatches.is_empty());
    assert!(outcome.harness_failures.is_empty());
}

#[test]
fn both_reject_with_expected_substring_agrees() {
    let temp = tempfile::tempdir().unwrap();
    let reference = fake_reference(
        temp.path(),
        "echo 'A.java:1: error: Foo cannot be resolved' >&2\nexit 1",
    );

    let primary = StubPrimary {
        succeeded: false,
        diagnostics: "A.java:1: Foo cannot be resolved to a type",
        artifacts: vec![],
    };
    let harness = Harness::new(primary, HarnessConfig::new())
        .with_handles(vec![handle_for(&reference)]);

    let outcome = harness.run(&unresolved_scenario()).unwrap();
    assert!(outcome.passed(), "cause: {:?}", outcome.failure_cause());
}

#[test]
fn both_reject_without_substring_is_a_message_mismatch() {
    let temp = tempfile::tempdir().unwrap();
    let reference = fake_reference(
        temp.path(),
        "echo 'A.java:1: error: something else entirely' >&2\nexit 1",
    );

    let primary = StubPrimary {
        succeeded: false,
        diagnostics: "A.java:1: Foo cannot be resolved to a type",
        artifacts: vec![],
    };
    let harness = Harness::new(primary, HarnessConfig::new())
        .with_handles(vec![handle_for(&reference)]);

    let outcome = harness.run(&unresolved_scenario()).unwrap();
    assert!(!outcome.passed());
    assert_eq!(outcome.mismatches.len(), 1);
    assert_eq!(outcome.mismatches[0].kind, MismatchKind::ErrorMessageMismatch);
    // Both logs travel with the record.
    assert!(outcome.mismatches[0].primary_log.contains("cannot be resolved"));
    assert!(outcome.mismatches[0].reference_log.contains("something else"));
}

#[test]
fn registered_excuse_downgrades_the_mismatch() {
    let temp = tempfile::tempdir().unwrap();
    let reference = fake_reference(
        temp.path(),
        "echo 'A.java:1: error: something else entirely' >&2\nexit 1",
    );

    let mut registry = ExcuseRegistry::new();
    registry.register(
        "Unresolved",
        Excuse::new(
            LevelPredicate::AtLeast(ComplianceLevel(9)),
            vec![MismatchKind::ErrorMessageMismatch],
            "reference wording changed in release 9",
        ),
    );

    let primary = StubPrimary {
        succeeded: false,
        diagnostics: "A.java:1: Foo cannot be resolved to a type",
        artifacts: vec![],
    };
    let harness = Harness::new(primary, HarnessConfig::new())
        .with_handles(vec![handle_for(&reference)])
        .with_registry(registry);

    let outcome = harness.run(&unresolved_scenario()).unwrap();
    assert!(outcome.passed());
    assert!(outcome.mismatches.is_empty());
    assert_eq!(outcome.suppressed.len(), 1);
    assert_eq!(
        outcome.suppressed[0].record.kind,
        MismatchKind::ErrorMessageMismatch
    );
}

#[test]
fn unexpected_artifact_is_reported_not_dropped() {
    let temp = tempfile::tempdir().unwrap();
    let reference = fake_reference(
        temp.path(),
        "touch \"$out/A.class\" \"$out/Extra.class\"\nexit 0",
    );

    let primary = StubPrimary {
        succeeded: true,
        diagnostics: "",
        artifacts: vec!["A.class"],
    };
    let harness = Harness::new(primary, HarnessConfig::new())
        .with_handles(vec![handle_for(&reference)]);

    let outcome = harness.run(&class_a_scenario()).unwrap();
    assert!(!outcome.passed());
    assert_eq!(outcome.mismatches.len(), 1);
    assert_eq!(outcome.mismatches[0].kind, MismatchKind::ArtifactSetMismatch);
}

#[test]
fn reference_warnings_only_rejection_is_classified_separately() {
    let temp = tempfile::tempdir().unwrap();
    let reference = fake_reference(
        temp.path(),
        "echo 'A.java:1: warning: raw type' >&2\nexit 1",
    );

    let primary = StubPrimary {
        succeeded: true,
        diagnostics: "",
        artifacts: vec![],
    };
    let harness = Harness::new(primary, HarnessConfig::new())
        .with_handles(vec![handle_for(&reference)]);

    let outcome = harness.run(&class_a_scenario()).unwrap();
    assert_eq!(outcome.mismatches.len(), 1);
    assert_eq!(
        outcome.mismatches[0].kind,
        MismatchKind::ReferenceWarningsPrimaryNone
    );
}

#[test]
fn primary_stricter_than_reference() {
    let temp = tempfile::tempdir().unwrap();
    let reference = fake_reference(temp.path(), "touch \"$out/A.class\"\nexit 0");

    let primary = StubPrimary {
        succeeded: false,
        diagnostics: "A.java:1: Foo cannot be resolved to a type",
        artifacts: vec![],
    };
    let harness = Harness::new(primary, HarnessConfig::new())
        .with_handles(vec![handle_for(&reference)]);

    let outcome = harness.run(&unresolved_scenario()).unwrap();
    // The primary-only assertion holds, but the disagreement still fails it.
    assert!(outcome.primary_ok);
    assert!(!outcome.passed());
    assert_eq!(
        outcome.mismatches[0].kind,
        MismatchKind::PrimaryErrorsReferenceNone
    );
}

#[test]
fn one_record_per_handle_and_other_handles_still_run() {
    let temp = tempfile::tempdir().unwrap();
    let agreeing = fake_reference(temp.path(), "touch \"$out/A.class\"\nexit 0");
    let broken = temp.path().join("missing-compiler");

    let primary = StubPrimary {
        succeeded: true,
        diagnostics: "",
        artifacts: vec!["A.class"],
    };
    let harness = Harness::new(primary, HarnessConfig::new()).with_handles(vec![
        ReferenceHandle::new(&broken, ComplianceLevel(11)).with_name("broken-11"),
        handle_for(&agreeing),
    ]);

    let outcome = harness.run(&class_a_scenario()).unwrap();
    // The broken handle surfaces as a harness failure, not a mismatch, and
    // does not stop the agreeing handle from running.
    assert_eq!(outcome.harness_failures.len(), 1);
    assert_eq!(outcome.harness_failures[0].handle, "broken-11");
    assert!(outcome.mismatches.is_empty());
}

#[test]
fn configured_output_root_is_left_artifact_free() {
    let temp = tempfile::tempdir().unwrap();
    let out_root = temp.path().join("out");
    let reference = fake_reference(temp.path(), "touch \"$out/A.class\"\nexit 0");

    let primary = StubPrimary {
        succeeded: true,
        diagnostics: "",
        artifacts: vec!["A.class"],
    };
    let harness = Harness::new(
        primary,
        HarnessConfig::new().with_output_root(&out_root),
    )
    .with_handles(vec![handle_for(&reference)]);

    let outcome = harness.run(&class_a_scenario()).unwrap();
    assert!(outcome.passed(), "cause: {:?}", outcome.failure_cause());

    // The final destructive snapshot cleared the scenario's subdirectory.
    let leftover: Vec<_> = walk_class_files(&out_root);
    assert!(leftover.is_empty(), "leftover artifacts: {leftover:?}");
}

fn walk_class_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                found.extend(walk_class_files(&path));
            } else if path.extension().and_then(|s| s.to_str()) == Some("class") {
                found.push(path);
            }
        }
    }
    found
}
