//! Divergence classification and the excuse registry.
//!
//! Agreement between the primary and reference compiler collapses into a
//! closed set of mismatch kinds. Known, intentional divergences are
//! pre-registered as excuses; a detected kind covered by an excuse is logged
//! rather than failed.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::invoke::ReferenceHandle;
use crate::scenario::ComplianceLevel;

/// Classified disagreement between the two compilers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MismatchKind {
    /// Primary rejects, reference accepts: the primary is stricter.
    PrimaryErrorsReferenceNone,
    /// Primary accepts, reference rejects with an error marker in its log.
    ReferenceErrorsPrimaryNone,
    /// Primary accepts, reference rejects with warnings only.
    ReferenceWarningsPrimaryNone,
    /// Both reject, but the expected diagnostic substring is absent from the
    /// reference log.
    ErrorMessageMismatch,
    /// Both accept, but the produced artifact set differs from expectation.
    ArtifactSetMismatch,
}

impl std::fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PrimaryErrorsReferenceNone => write!(f, "primary errors, reference none"),
            Self::ReferenceErrorsPrimaryNone => write!(f, "reference errors, primary none"),
            Self::ReferenceWarningsPrimaryNone => write!(f, "reference warnings, primary none"),
            Self::ErrorMessageMismatch => write!(f, "compile error message mismatch"),
            Self::ArtifactSetMismatch => write!(f, "artifact set mismatch"),
        }
    }
}

/// What the orchestrator observed for one (scenario, handle) iteration.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    /// Primary compiler accepted the sources.
    pub primary_accepted: bool,
    /// Reference compiler exited successfully.
    pub reference_accepted: bool,
    /// Expected diagnostic substring found in the trimmed reference log.
    pub log_has_expected: bool,
    /// Reference log contains an error marker (vs warnings only).
    pub log_has_error_marker: bool,
    /// Artifact diff between expected and actual sets came back clean.
    pub artifacts_clean: bool,
}

/// Classify one observation into a mismatch kind, or agreement.
///
/// Total over the {accept,reject} x {accept,reject} product: every
/// well-formed observation maps to exactly one kind or to `None`.
#[must_use]
pub const fn classify(obs: &Observation) -> Option<MismatchKind> {
    match (obs.primary_accepted, obs.reference_accepted) {
        (false, true) => Some(MismatchKind::PrimaryErrorsReferenceNone),
        (true, false) => {
            if obs.log_has_error_marker {
                Some(MismatchKind::ReferenceErrorsPrimaryNone)
            } else {
                Some(MismatchKind::ReferenceWarningsPrimaryNone)
            }
        }
        (false, false) => {
            if obs.log_has_expected {
                None
            } else {
                Some(MismatchKind::ErrorMessageMismatch)
            }
        }
        (true, true) => {
            if obs.artifacts_clean {
                None
            } else {
                Some(MismatchKind::ArtifactSetMismatch)
            }
        }
    }
}

static ERROR_MARKER: OnceLock<Regex> = OnceLock::new();

/// Whether a reference log contains an error marker (as opposed to
/// warnings only). Matches the per-diagnostic marker shape ("error:") and
/// the trailing count line ("2 errors"); a bare mention of the word, say an
/// identifier named `error` inside a warning, does not count.
#[must_use]
pub fn log_has_error_marker(log: &str) -> bool {
    let pattern = ERROR_MARKER
        .get_or_init(|| Regex::new(r"(?mi)\berror:|^\s*\d+ errors?\s*$").unwrap());
    pattern.is_match(log)
}

/// One classified disagreement, with full context for reporting.
/// Ephemeral: scoped to a single scenario run.
#[derive(Debug, Clone)]
pub struct MismatchRecord {
    pub kind: MismatchKind,
    pub scenario: String,
    pub handle: String,
    pub primary_log: String,
    pub reference_log: String,
}

impl std::fmt::Display for MismatchRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{} vs {}]\n--- primary log ---\n{}\n--- reference log ---\n{}",
            self.kind, self.scenario, self.handle, self.primary_log, self.reference_log
        )
    }
}

/// Version predicate restricting which reference handles an excuse covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelPredicate {
    Any,
    AtLeast(ComplianceLevel),
    AtMost(ComplianceLevel),
    Exactly(ComplianceLevel),
}

impl LevelPredicate {
    #[must_use]
    pub fn matches(&self, level: ComplianceLevel) -> bool {
        match *self {
            Self::Any => true,
            Self::AtLeast(min) => level >= min,
            Self::AtMost(max) => level <= max,
            Self::Exactly(exact) => level == exact,
        }
    }
}

/// A pre-registered, justified suppression of a known divergence.
#[derive(Debug, Clone)]
pub struct Excuse {
    pub predicate: LevelPredicate,
    pub kinds: Vec<MismatchKind>,
    pub justification: String,
}

impl Excuse {
    pub fn new(
        predicate: LevelPredicate,
        kinds: Vec<MismatchKind>,
        justification: impl Into<String>,
    ) -> Self {
        Self {
            predicate,
            kinds,
            justification: justification.into(),
        }
    }

    #[must_use]
    pub fn covers(&self, kind: MismatchKind) -> bool {
        self.kinds.contains(&kind)
    }
}

/// Lookup from (scenario identity, handle level) to suppressed mismatch
/// kinds. Absence of an entry means any detected kind fails the scenario.
#[derive(Debug, Clone, Default)]
pub struct ExcuseRegistry {
    entries: HashMap<String, Vec<Excuse>>,
}

impl ExcuseRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an excuse for one scenario.
    pub fn register(&mut self, scenario: impl Into<String>, excuse: Excuse) {
        self.entries.entry(scenario.into()).or_default().push(excuse);
    }

    /// First excuse registered for this scenario whose predicate matches the
    /// handle's compliance level.
    #[must_use]
    pub fn excuse_for(&self, handle: &ReferenceHandle, scenario: &str) -> Option<&Excuse> {
        self.entries
            .get(scenario)?
            .iter()
            .find(|excuse| excuse.predicate.matches(handle.level))
    }
}
