//! Test scenario definitions.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// One source file of a scenario: a relative path plus its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the scenario work directory (e.g. "p/A.java").
    pub path: PathBuf,
    /// Full source text.
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Whether a scenario expects the primary compiler to accept or reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenarioMode {
    /// Sources are valid; compilation must succeed.
    #[default]
    Conforming,
    /// Sources are invalid; compilation must fail with the expected diagnostics.
    Negative,
}

/// Compliance level of a compiler (language release number, e.g. 8, 17, 21).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComplianceLevel(pub u16);

impl std::fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One self-contained differential test case.
///
/// Built once per run via the `with_*` methods and immutable thereafter.
#[derive(Debug, Clone)]
pub struct TestScenario {
    /// Scenario identity, used for reporting and excuse lookup.
    pub name: String,
    /// Ordered source files.
    pub sources: Vec<SourceFile>,
    /// Substring expected in the primary compiler's diagnostics (negative
    /// mode) or output (conforming mode, usually empty).
    pub expected_primary: String,
    /// Substring expected in the reference compiler's log when both
    /// compilers reject. Falls back to `expected_primary` when unset.
    pub expected_reference: Option<String>,
    /// Conforming vs negative.
    pub mode: ScenarioMode,
    /// Per-scenario option string, in the primary compiler's dialect.
    pub options: String,
    /// Reference handles below this level are skipped, not compared.
    pub min_level: Option<ComplianceLevel>,
}

impl TestScenario {
    pub fn new(name: impl Into<String>, sources: Vec<SourceFile>) -> Self {
        Self {
            name: name.into(),
            sources,
            expected_primary: String::new(),
            expected_reference: None,
            mode: ScenarioMode::default(),
            options: String::new(),
            min_level: None,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ScenarioMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_expected_primary(mut self, expected: impl Into<String>) -> Self {
        self.expected_primary = expected.into();
        self
    }

    #[must_use]
    pub fn with_expected_reference(mut self, expected: impl Into<String>) -> Self {
        self.expected_reference = Some(expected.into());
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = options.into();
        self
    }

    #[must_use]
    pub fn with_min_level(mut self, level: ComplianceLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    /// Substring to look for in the reference log when both compilers reject.
    #[must_use]
    pub fn reference_expectation(&self) -> &str {
        self.expected_reference
            .as_deref()
            .unwrap_or(&self.expected_primary)
    }

    /// Ordered source file names, relative to the work directory.
    #[must_use]
    pub fn source_names(&self) -> Vec<String> {
        self.sources
            .iter()
            .map(|s| s.path.display().to_string())
            .collect()
    }

    /// Write all source files under `work_dir`, creating parent directories.
    ///
    /// A conforming scenario with no sources is rejected up front: there
    /// would be nothing to compile and the comparison would be vacuous.
    pub fn materialize(&self, work_dir: &Path) -> Result<()> {
        if self.sources.is_empty() && self.mode == ScenarioMode::Conforming {
            return Err(Error::EmptyScenario);
        }
        for source in &self.sources {
            let path = work_dir.join(&source.path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &source.text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let scenario = TestScenario::new("t", vec![SourceFile::new("A.java", "class A {}")]);
        assert_eq!(scenario.mode, ScenarioMode::Conforming);
        assert_eq!(scenario.reference_expectation(), "");
        assert!(scenario.min_level.is_none());
    }

    #[test]
    fn reference_expectation_falls_back_to_primary() {
        let scenario = TestScenario::new("t", vec![])
            .with_mode(ScenarioMode::Negative)
            .with_expected_primary("cannot be resolved");
        assert_eq!(scenario.reference_expectation(), "cannot be resolved");

        let scenario = scenario.with_expected_reference("cannot find symbol");
        assert_eq!(scenario.reference_expectation(), "cannot find symbol");
    }

    #[test]
    fn materialize_writes_nested_sources() {
        let temp = tempfile::tempdir().unwrap();
        let scenario = TestScenario::new(
            "t",
            vec![
                SourceFile::new("p/A.java", "package p; class A {}"),
                SourceFile::new("B.java", "class B {}"),
            ],
        );
        scenario.materialize(temp.path()).unwrap();
        assert!(temp.path().join("p/A.java").is_file());
        assert!(temp.path().join("B.java").is_file());
    }

    #[test]
    fn conforming_scenario_requires_sources() {
        let temp = tempfile::tempdir().unwrap();
        let scenario = TestScenario::new("t", vec![]);
        assert!(matches!(
            scenario.materialize(temp.path()),
            Err(Error::EmptyScenario)
        ));
    }
}
