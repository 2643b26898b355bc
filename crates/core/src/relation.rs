//! Reading-relation resolver (component B): classify how two readings at the
//! same variant unit relate in the local stemma.

use crate::store::DataStore;
use crate::types::{ParentExpr, ReadingLabel, VariantUnitId};

/// How one reading relates to another at the same variant unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Equal,
    /// The first reading is the direct parent of the second.
    Prior,
    /// The first reading is the direct child of the second.
    Posterior,
    /// One of the two has an unclear parent.
    Unclear,
    NoRelation,
}

/// Classify the relationship of `r1` to `r2` at `vu`, from `r1`'s point of
/// view: [`Relation::Prior`] means `r1` is `r2`'s direct parent.
///
/// Only direct parentage is examined; transitive ancestry is not walked
/// here. The caller is responsible for having already confirmed the local
/// stemma at `vu` is acyclic (via [`DataStore::build`]).
#[must_use]
pub fn classify(
    store: &DataStore,
    vu: &VariantUnitId,
    r1: &ReadingLabel,
    r2: &ReadingLabel,
) -> Relation {
    if r1 == r2 {
        return Relation::Equal;
    }

    let p2 = store.reading(vu, r2).map(|r| &r.parent);
    if p2.is_some_and(|p| p.is_single(r1)) {
        return Relation::Prior;
    }

    let p1 = store.reading(vu, r1).map(|r| &r.parent);
    if p1.is_some_and(|p| p.is_single(r2)) {
        return Relation::Posterior;
    }

    if matches!(p1, Some(ParentExpr::Unclear)) || matches!(p2, Some(ParentExpr::Unclear)) {
        return Relation::Unclear;
    }

    Relation::NoRelation
}
