//! Error taxonomy for store construction and coherence computation.

use crate::types::{ReadingLabel, VariantUnitId, Witness};

/// Errors raised while validating or querying a [`crate::store::DataStore`].
///
/// `VariantUnitId` appears as the sole field of three variants
/// (`CyclicLocalStemma`, `MissingVariantUnit`, `ForestDetected`), so a
/// blanket `#[derive(From)]` would emit three conflicting
/// `impl From<VariantUnitId> for CbgmError`s. Every variant here is built by
/// name at its call site instead; the two conversions below are hand-written
/// rather than derived so adding a new `VariantUnitId`- or `Witness`-shaped
/// variant can never silently reintroduce the clash.
#[derive(Debug, PartialEq, Eq)]
pub enum CbgmError {
    /// A manuscript attests two readings at the same variant unit.
    DuplicateAttestation {
        witness: Witness,
        variant_unit: VariantUnitId,
    },
    /// The local stemma at a variant unit contains a cycle; `parent` ->
    /// `child` is one edge that participates in it.
    CyclicLocalStemma {
        variant_unit: VariantUnitId,
        parent: ReadingLabel,
        child: ReadingLabel,
    },
    /// A reading names itself, directly or as a multi-parent conjunct, as its
    /// own parent.
    SelfParentingReading {
        variant_unit: VariantUnitId,
        label: ReadingLabel,
    },
    /// A parent expression names a label that does not exist at this variant
    /// unit.
    UnknownParentLabel {
        variant_unit: VariantUnitId,
        label: ReadingLabel,
        unknown_parent: ReadingLabel,
    },
    /// A query named a witness absent from the store.
    MissingWitness(Witness),
    /// A query named a variant unit absent from the store.
    MissingVariantUnit(VariantUnitId),
    /// The independently-derived NOREL count disagreed with the arithmetic
    /// identity `PASS - EQ - UNCL - (W1<W2) - (W1>W2)`.
    NorelMismatch {
        witness: Witness,
        expected: i64,
        computed: i64,
    },
    /// Perfect-coherence textual flow requested but some non-`A` witness has
    /// no parent arc.
    ForestDetected { variant_unit: VariantUnitId },
    /// The destination for a computed artifact already exists and the caller
    /// asked to skip rather than overwrite.
    OutputExists(String),
}

impl From<Witness> for CbgmError {
    fn from(witness: Witness) -> Self {
        Self::MissingWitness(witness)
    }
}

impl From<String> for CbgmError {
    fn from(path: String) -> Self {
        Self::OutputExists(path)
    }
}

impl std::fmt::Display for CbgmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateAttestation {
                witness,
                variant_unit,
            } => write!(
                f,
                "witness {witness} attests more than one reading at {}",
                variant_unit.as_str()
            ),
            Self::CyclicLocalStemma {
                variant_unit,
                parent,
                child,
            } => write!(
                f,
                "local stemma at {} is cyclic: {parent} -> {child} completes the cycle",
                variant_unit.as_str()
            ),
            Self::SelfParentingReading {
                variant_unit,
                label,
            } => write!(
                f,
                "reading {label} at {} names itself as a parent",
                variant_unit.as_str()
            ),
            Self::UnknownParentLabel {
                variant_unit,
                label,
                unknown_parent,
            } => write!(
                f,
                "reading {label} at {} names unknown parent {unknown_parent}",
                variant_unit.as_str()
            ),
            Self::MissingWitness(witness) => write!(f, "unknown witness {witness}"),
            Self::MissingVariantUnit(vu) => write!(f, "unknown variant unit {}", vu.as_str()),
            Self::NorelMismatch {
                witness,
                expected,
                computed,
            } => write!(
                f,
                "NOREL mismatch for {witness}: expected {expected}, computed {computed}"
            ),
            Self::ForestDetected { variant_unit } => write!(
                f,
                "textual flow at {} is a forest, not a tree",
                variant_unit.as_str()
            ),
            Self::OutputExists(path) => write!(f, "output already exists: {path}"),
        }
    }
}

impl std::error::Error for CbgmError {}
