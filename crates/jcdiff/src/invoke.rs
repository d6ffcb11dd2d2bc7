//! Reference-compiler invocation.
//!
//! The reference compiler is an external process: it is spawned in the
//! scenario's working directory, handed the translated option string plus
//! the source file names, and waited on synchronously. There is no harness
//! timeout; bounding execution time is the caller's concern.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::scenario::ComplianceLevel;
use crate::{Error, Result};

/// Identity of one external reference compiler instance.
///
/// Built once at harness startup from static configuration and reused
/// across all scenarios.
#[derive(Debug, Clone)]
pub struct ReferenceHandle {
    /// Display name used in reports (e.g. "javac-17").
    pub name: String,
    /// Compliance level this compiler implements.
    pub level: ComplianceLevel,
    /// Invocable path.
    pub program: PathBuf,
    /// Pinned working directory; falls back to the per-invocation one.
    pub working_dir: Option<PathBuf>,
}

impl ReferenceHandle {
    pub fn new(program: impl Into<PathBuf>, level: ComplianceLevel) -> Self {
        let program = program.into();
        let name = program
            .file_stem()
            .and_then(|s| s.to_str())
            .map_or_else(|| "reference".to_string(), |s| format!("{s}-{level}"));
        Self {
            name,
            level,
            program,
            working_dir: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Captured result of one reference-compiler run.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Child exit code (-1 when terminated by signal).
    pub exit_code: i32,
    /// Combined stdout+stderr, post-trimming.
    pub log: String,
    /// Whether the child exited successfully.
    pub success: bool,
}

/// Line filter applied to captured logs before comparison. Returns whether
/// the line is kept; line order is preserved.
pub type LogTrimmer = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Default trimmer: drops reference-only noise lines that carry no
/// diagnostic signal.
fn is_signal_line(line: &str) -> bool {
    let line = line.trim_start();
    !(line.starts_with("Note:") || line.starts_with("Picked up "))
}

/// Spawns the reference compiler and captures its output.
pub struct Invoker {
    trimmer: LogTrimmer,
}

impl Default for Invoker {
    fn default() -> Self {
        Self {
            trimmer: Box::new(is_signal_line),
        }
    }
}

impl Invoker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the log-trimming hook.
    #[must_use]
    pub fn with_trimmer(trimmer: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            trimmer: Box::new(trimmer),
        }
    }

    /// Run the reference compiler to completion.
    ///
    /// Source names are appended after the option tokens unless
    /// `repeat_file_names` is false (some option strings already embed
    /// them). Launch failure or an interrupted wait is fatal to the current
    /// handle's iteration only and is never retried: invocation is assumed
    /// deterministic, so a retry would only mask the root cause.
    pub fn invoke(
        &self,
        handle: &ReferenceHandle,
        work_dir: &Path,
        options: &str,
        source_names: &[String],
        repeat_file_names: bool,
    ) -> Result<ExecutionResult> {
        let dir = handle.working_dir.as_deref().unwrap_or(work_dir);

        let mut command = Command::new(&handle.program);
        command.current_dir(dir).args(options.split_whitespace());
        if repeat_file_names {
            command.args(source_names);
        }

        debug!(
            handle = %handle.name,
            dir = %dir.display(),
            options,
            "invoking reference compiler"
        );

        let output = command.output().map_err(|source| Error::Invocation {
            program: handle.program.display().to_string(),
            source,
        })?;

        let mut raw = String::from_utf8_lossy(&output.stdout).into_owned();
        raw.push_str(&String::from_utf8_lossy(&output.stderr));
        let log = self.trim(&raw);

        Ok(ExecutionResult {
            exit_code: output.status.code().unwrap_or(-1),
            success: output.status.success(),
            log,
        })
    }

    /// Apply the trimming hook line by line, preserving order.
    fn trim(&self, raw: &str) -> String {
        raw.lines()
            .filter(|line| (self.trimmer)(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_trimmer_drops_noise() {
        let invoker = Invoker::new();
        let raw = "A.java:1: error: x\nNote: uses deprecated API\nPicked up JAVA_OPTS\n1 error\n";
        assert_eq!(invoker.trim(raw), "A.java:1: error: x\n1 error");
    }

    #[test]
    fn custom_trimmer_preserves_order() {
        let invoker = Invoker::with_trimmer(|line| !line.contains("drop"));
        assert_eq!(invoker.trim("a\ndrop me\nb\n"), "a\nb");
    }

    #[test]
    fn handle_name_derived_from_program() {
        let handle = ReferenceHandle::new("/usr/bin/javac", ComplianceLevel(17));
        assert_eq!(handle.name, "javac-17");
        let named = handle.with_name("ecj");
        assert_eq!(named.name, "ecj");
    }

    #[cfg(unix)]
    mod process {
        use std::os::unix::fs::PermissionsExt;

        use super::*;

        fn fake_compiler(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fakec");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
            path
        }

        #[test]
        fn captures_exit_and_log() {
            let temp = tempfile::tempdir().unwrap();
            let program = fake_compiler(temp.path(), "echo \"$@\"\necho oops >&2\nexit 2");
            let handle = ReferenceHandle::new(&program, ComplianceLevel(17));

            let result = Invoker::new()
                .invoke(
                    &handle,
                    temp.path(),
                    "--release 17",
                    &["A.java".to_string()],
                    true,
                )
                .unwrap();
            assert!(!result.success);
            assert_eq!(result.exit_code, 2);
            assert!(result.log.contains("--release 17 A.java"));
            assert!(result.log.contains("oops"));
        }

        #[test]
        fn file_names_omitted_when_not_repeated() {
            let temp = tempfile::tempdir().unwrap();
            let program = fake_compiler(temp.path(), "echo \"$@\"");
            let handle = ReferenceHandle::new(&program, ComplianceLevel(17));

            let result = Invoker::new()
                .invoke(&handle, temp.path(), "A.java", &["A.java".to_string()], false)
                .unwrap();
            assert!(result.success);
            assert_eq!(result.log.trim(), "A.java");
        }

        #[test]
        fn launch_failure_is_invocation_error() {
            let temp = tempfile::tempdir().unwrap();
            let handle =
                ReferenceHandle::new(temp.path().join("missing"), ComplianceLevel(17));
            let err = Invoker::new()
                .invoke(&handle, temp.path(), "", &[], true)
                .unwrap_err();
            assert!(matches!(err, Error::Invocation { .. }));
            assert!(err.is_iteration_scoped());
        }
    }
}
