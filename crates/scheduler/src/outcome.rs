//! Typed stand-in for a process exit code: since no CLI binary is built
//! here, a driver maps [`RunOutcome`] onto whatever exit convention it uses.

use cbgm_core::types::{VariantUnitId, Witness};
use cbgm_core::CbgmError;

/// `ConfigMismatch`, `MissingInput`, and `ConflictingSources` all wrap a bare
/// `String`, so a blanket `#[derive(From)]` would emit three conflicting
/// `impl From<String> for RunOutcome`s. The conversions below are
/// hand-written instead, one per uniquely-typed variant.
#[derive(Debug)]
pub enum RunOutcome {
    ConfigMismatch(String),
    MissingInput(String),
    MissingWitness(Witness),
    MissingVariantUnit(VariantUnitId),
    ConflictingSources(String),
    InvariantViolation(CbgmError),
}

impl From<Witness> for RunOutcome {
    fn from(witness: Witness) -> Self {
        Self::MissingWitness(witness)
    }
}

impl From<VariantUnitId> for RunOutcome {
    fn from(vu: VariantUnitId) -> Self {
        Self::MissingVariantUnit(vu)
    }
}

impl From<CbgmError> for RunOutcome {
    fn from(err: CbgmError) -> Self {
        Self::InvariantViolation(err)
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigMismatch(msg) => write!(f, "configuration mismatch: {msg}"),
            Self::MissingInput(msg) => write!(f, "missing input: {msg}"),
            Self::MissingWitness(w) => write!(f, "unknown witness: {w}"),
            Self::MissingVariantUnit(vu) => write!(f, "unknown variant unit: {}", vu.as_str()),
            Self::ConflictingSources(msg) => write!(f, "conflicting sources: {msg}"),
            Self::InvariantViolation(err) => write!(f, "invariant violation: {err}"),
        }
    }
}

impl std::error::Error for RunOutcome {}
