use std::path::PathBuf;

use thiserror::Error;

/// Harness errors.
///
/// Translation and invocation errors are scoped to a single reference-handle
/// iteration; artifact I/O errors invalidate the shared output directory and
/// abort the whole scenario.
#[derive(Error, Debug)]
pub enum Error {
    #[error("translation error: {0}")]
    Translation(String),
    #[error("artifact I/O error at {path}: {source}")]
    ArtifactIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to invoke {program}: {source}")]
    Invocation {
        program: String,
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("scenario has no source files")]
    EmptyScenario,
}

impl Error {
    /// Whether this error aborts only the current reference-handle iteration
    /// rather than the whole scenario.
    #[must_use]
    pub const fn is_iteration_scoped(&self) -> bool {
        matches!(self, Self::Translation(_) | Self::Invocation { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
