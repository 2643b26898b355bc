//! Parent-combination search (component E): the minimal sets of potential
//! ancestors that jointly explain a witness's reading at one variant unit.

use hashbrown::HashSet;

use crate::coherence::genealogical::GenealogicalCoherence;
use crate::types::{ParentExpr, ReadingLabel, VariantUnitId, Witness};

/// A connectivity cap on which potential ancestors are eligible to explain a
/// reading.
#[derive(Debug, Clone, Copy)]
pub enum ConnectivityBound {
    /// Only ranks `<= n` (by `_NR`) are eligible.
    MaxRank(u32),
    /// Only rows whose coherence percentage is `>= p` are eligible.
    MinPercent(f64),
}

impl ConnectivityBound {
    fn admits(self, nr: u32, perc1: u32) -> bool {
        match self {
            Self::MaxRank(max_rank) => nr != 0 && nr <= max_rank,
            Self::MinPercent(min_perc) => nr != 0 && f64::from(perc1) >= min_perc,
        }
    }
}

/// One witness's contribution to a parent combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CombinationMember {
    pub witness_index: usize,
    pub rank: u32,
    pub perc1: u32,
    pub generation: u32,
}

/// A set of witnesses whose readings, taken together, explain a target
/// reading (directly, or via the target's parent expression).
pub type Combination = Vec<CombinationMember>;

/// Only generation-1-or-2 combinations are usable for textual flow.
const MAX_ACCEPTABLE_GENERATION: u32 = 2;

/// Searches for every combination of `coh`'s potential ancestors that
/// explains `reading` (with parentage `parent_expr`) at `vu`.
///
/// `witness_of` resolves a [`CombinationMember::witness_index`] back to a
/// [`Witness`]; indices are assigned densely over `coh.rows()` to avoid
/// cloning witness identifiers on every recursive call.
pub struct ParentSearch<'a> {
    coh: &'a GenealogicalCoherence<'a>,
    vu: &'a VariantUnitId,
    bound: ConnectivityBound,
    witnesses: Vec<Witness>,
}

impl<'a> ParentSearch<'a> {
    #[must_use]
    pub fn new(coh: &'a GenealogicalCoherence<'a>, vu: &'a VariantUnitId, bound: ConnectivityBound) -> Self {
        let witnesses = coh.rows().iter().map(|r| r.w2.clone()).collect();
        Self { coh, vu, bound, witnesses }
    }

    #[must_use]
    pub fn witness(&self, index: usize) -> &Witness {
        &self.witnesses[index]
    }

    /// Finds all combinations explaining `reading`/`parent_expr`, or, when
    /// none are found and `parent_expr` is [`ParentExpr::OverlapParent`], a
    /// synthetic single-member combination standing in for the lost
    /// overlapping-unit parent.
    #[must_use]
    pub fn search(&self, reading: &ReadingLabel, parent_expr: &ParentExpr) -> Vec<Combination> {
        let mut visited = HashSet::new();
        let found = self.search_inner(reading, parent_expr, 1, &mut visited);

        if found.is_empty() && matches!(parent_expr, ParentExpr::OverlapParent) {
            return vec![vec![CombinationMember {
                witness_index: usize::MAX,
                rank: 0,
                perc1: 100,
                generation: 1,
            }]];
        }
        found
    }

    fn search_inner(
        &self,
        reading: &ReadingLabel,
        parent_expr: &ParentExpr,
        generation: u32,
        visited: &mut HashSet<ReadingLabel>,
    ) -> Vec<Combination> {
        let mut direct: Vec<Combination> = Vec::new();

        for (index, row) in self.coh.rows().iter().enumerate() {
            if !self.bound.admits(row.nr, row.perc1) {
                continue;
            }
            let Some(w2_reading) = self.coh.store().reading_of(&row.w2, self.vu) else {
                continue;
            };
            if w2_reading == reading {
                direct.push(vec![CombinationMember {
                    witness_index: index,
                    rank: row.nr,
                    perc1: row.perc1,
                    generation,
                }]);
            }
        }

        if matches!(
            parent_expr,
            ParentExpr::Initial | ParentExpr::OverlapParent | ParentExpr::Unclear
        ) {
            return direct;
        }

        let mut partial_explanations: Vec<Vec<Combination>> = Vec::new();
        for conjunct in parent_expr.conjuncts() {
            if !visited.insert(conjunct.clone()) {
                continue;
            }
            let conjunct_parent = self
                .coh
                .store()
                .reading(self.vu, conjunct)
                .map(|r| r.parent.clone())
                .unwrap_or(ParentExpr::Unclear);
            let explanation = self.search_inner(conjunct, &conjunct_parent, generation + 1, visited);
            partial_explanations.push(explanation);
        }

        if partial_explanations.is_empty() {
            return direct;
        }

        if partial_explanations.len() == 1 {
            direct.extend(partial_explanations.into_iter().next().unwrap());
            return direct;
        }

        for combo in cartesian_union(&partial_explanations) {
            direct.push(combo);
        }
        direct
    }

    /// The maximum rank and generation within a combination, used by
    /// textual-flow selection.
    #[must_use]
    pub fn bounds_of(combination: &[CombinationMember]) -> (u32, u32) {
        let rank = combination.iter().map(|m| m.rank).max().unwrap_or(0);
        let generation = combination.iter().map(|m| m.generation).max().unwrap_or(0);
        (rank, generation)
    }

    #[must_use]
    pub fn is_within_flow_generation(combination: &[CombinationMember]) -> bool {
        Self::bounds_of(combination).1 <= MAX_ACCEPTABLE_GENERATION
    }
}

/// Cartesian product of every conjunct's candidate combinations, each
/// product flattened and deduplicated by member.
fn cartesian_union(explanations: &[Vec<Combination>]) -> Vec<Combination> {
    let mut acc: Vec<Combination> = vec![Vec::new()];
    for options in explanations {
        if options.is_empty() {
            return Vec::new();
        }
        let mut next = Vec::with_capacity(acc.len() * options.len());
        for prefix in &acc {
            for option in options {
                let mut combined: HashSet<CombinationMember> = prefix.iter().copied().collect();
                combined.extend(option.iter().copied());
                next.push(combined.into_iter().collect());
            }
        }
        acc = next;
    }
    acc
}

/// Picks the best combination for textual-flow drawing from a search
/// result: prefer the lowest-generation option if any reaches generation 1,
/// tie-broken by lowest maximum rank; otherwise the lowest-maximum-rank
/// option overall.
#[must_use]
pub fn select_for_textual_flow(combinations: &[Combination]) -> Option<&Combination> {
    let eligible: Vec<&Combination> = combinations
        .iter()
        .filter(|c| !c.is_empty())
        .filter(|c| ParentSearch::is_within_flow_generation(c))
        .collect();

    if eligible.is_empty() {
        return None;
    }

    let best_by_gen = eligible
        .iter()
        .copied()
        .min_by_key(|c| {
            let (rank, gen) = ParentSearch::bounds_of(c);
            (gen, rank)
        });

    if let Some(best) = best_by_gen {
        if ParentSearch::bounds_of(best).1 == 1 {
            return Some(best);
        }
    }

    eligible
        .into_iter()
        .min_by_key(|c| ParentSearch::bounds_of(c).0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coherence::genealogical::GenealogicalCoherence;
    use crate::store::DataStore;
    use crate::types::Reading;
    use hashbrown::HashSet as HSet;

    fn reading(label: &str, parent: &str) -> Reading {
        Reading {
            label: ReadingLabel::from(label),
            text: String::new(),
            parent: ParentExpr::parse(parent),
        }
    }

    fn single_parent_store() -> (DataStore, VariantUnitId) {
        let vu = VariantUnitId("B01K01V01/1".to_string());
        let store = DataStore::build(vec![
            (
                vu.clone(),
                reading("a", "INIT"),
                HSet::from([Witness::from("A"), Witness::from("D")]),
            ),
            (vu.clone(), reading("b", "a"), HSet::from([Witness::from("C")])),
        ])
        .unwrap();
        (store, vu)
    }

    #[test]
    fn finds_direct_parent_combination() {
        let (store, vu) = single_parent_store();
        let coh = GenealogicalCoherence::compute(&store, Witness::from("C")).unwrap();
        let search = ParentSearch::new(&coh, &vu, ConnectivityBound::MaxRank(499));
        let combos = search.search(&ReadingLabel::from("a"), &ParentExpr::Initial);
        assert!(!combos.is_empty());
        assert!(combos
            .iter()
            .any(|c| c.len() == 1 && c[0].generation == 1));
    }

    #[test]
    fn overlap_parent_with_no_match_yields_synthetic_combination() {
        let (store, vu) = single_parent_store();
        let coh = GenealogicalCoherence::compute(&store, Witness::from("C")).unwrap();
        let search = ParentSearch::new(&coh, &vu, ConnectivityBound::MaxRank(0));
        let combos = search.search(&ReadingLabel::from("z"), &ParentExpr::OverlapParent);
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0][0].witness_index, usize::MAX);
    }
}
