//! Artifact set tracking for the shared output directory.
//!
//! Both compilers write their binary artifacts into one reused output root.
//! The tracker's snapshot is a destructive read: every artifact is recorded
//! and deleted in the same pass, so each iteration starts from a provably
//! artifact-free directory. Do not replace this with a non-destructive walk;
//! later iterations depend on the clearing.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// File suffix of generated binary artifacts.
pub const ARTIFACT_SUFFIX: &str = "class";

/// Set of artifact paths (relative to the output root) captured at a point
/// in time. Ephemeral: scoped to a single scenario iteration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArtifactSnapshot {
    files: BTreeSet<PathBuf>,
}

/// Two-way set difference between an expected and an actual snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDiff {
    /// Expected but not produced.
    pub missing: BTreeSet<PathBuf>,
    /// Produced but not expected.
    pub unexpected: BTreeSet<PathBuf>,
}

impl ArtifactDiff {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

impl std::fmt::Display for ArtifactDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "missing: [{}], unexpected: [{}]",
            join_paths(&self.missing),
            join_paths(&self.unexpected)
        )
    }
}

fn join_paths(paths: &BTreeSet<PathBuf>) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ArtifactSnapshot {
    /// Build a snapshot from explicit relative paths (the expected set).
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: paths.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files.contains(path.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    /// Difference in both directions, with `self` as the expected set.
    #[must_use]
    pub fn diff(&self, actual: &Self) -> ArtifactDiff {
        ArtifactDiff {
            missing: self.files.difference(&actual.files).cloned().collect(),
            unexpected: actual.files.difference(&self.files).cloned().collect(),
        }
    }
}

/// Walks the output root for artifacts, removing them as they are recorded.
#[derive(Debug, Clone)]
pub struct ArtifactTracker {
    suffix: String,
}

impl Default for ArtifactTracker {
    fn default() -> Self {
        Self {
            suffix: ARTIFACT_SUFFIX.to_string(),
        }
    }
}

impl ArtifactTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Capture and delete every artifact under `root`, then prune
    /// directories left empty as a result (except `root` itself).
    ///
    /// A missing root yields the empty snapshot. Any other walk or delete
    /// failure is `Error::ArtifactIo` and aborts the whole scenario: the
    /// directory state is unknown afterwards and every later comparison
    /// would inherit it.
    pub fn take_and_clear(&self, root: &Path) -> Result<ArtifactSnapshot> {
        let mut files = BTreeSet::new();
        if root.exists() {
            self.clear_dir(root, root, &mut files)?;
        }
        Ok(ArtifactSnapshot { files })
    }

    fn clear_dir(&self, root: &Path, dir: &Path, files: &mut BTreeSet<PathBuf>) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|source| Error::ArtifactIo {
            path: dir.to_path_buf(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| Error::ArtifactIo {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();

            if path.is_dir() {
                self.clear_dir(root, &path, files)?;
                // Only prune if the walk emptied it; "not empty" is expected.
                let _ = fs::remove_dir(&path);
                continue;
            }

            if path.extension().and_then(|s| s.to_str()) != Some(self.suffix.as_str()) {
                continue;
            }

            fs::remove_file(&path).map_err(|source| Error::ArtifactIo {
                path: path.clone(),
                source,
            })?;
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            files.insert(relative);
        }

        Ok(())
    }
}
